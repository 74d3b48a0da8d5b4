//! Simulated sign-in with a durable session record.
//!
//! Any plausible email and a password of at least six characters is accepted;
//! there is no identity provider behind this.

use std::{collections::HashMap, fs, path::PathBuf, sync::Arc};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::User;

pub const SESSION_KEY: &str = "smartdeco_user";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "请输入有效的邮箱地址，密码至少6位。";
pub const MIN_PASSWORD_LEN: usize = 6;
const LOGIN_DISPLAY_NAME: &str = "设计师用户";
const REGISTER_DEFAULT_NAME: &str = "新用户";
const DEFAULT_AVATAR: &str = "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?ixlib=rb-1.2.1&auto=format&fit=facearea&facepad=2&w=256&h=256&q=80";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,
    #[error("session storage error: {0}")]
    Storage(String),
}

/// String key-value persistence for the session record.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Keeps all entries in one JSON object on disk.
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| AuthError::Storage(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| AuthError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| AuthError::Storage(e.to_string()))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

fn credentials_plausible(email: &str, password: &str) -> bool {
    email.contains('@') && password.chars().count() >= MIN_PASSWORD_LEN
}

pub struct AuthService {
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<User>>,
}

impl AuthService {
    /// Restores a persisted session, if any. An unreadable record is discarded.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let restored = match store.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!("👤 Restored session for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("⚠️ Discarding unreadable session record: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("⚠️ Could not read session store: {}", e);
                None
            }
        };
        Self { store, current: RwLock::new(restored) }
    }

    pub fn current(&self) -> Option<User> {
        self.current.read().clone()
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.sign_in(email, password, LOGIN_DISPLAY_NAME.to_string())
    }

    pub fn register(&self, name: Option<&str>, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(REGISTER_DEFAULT_NAME)
            .to_string();
        self.sign_in(email, password, name)
    }

    fn sign_in(&self, email: &str, password: &str, name: String) -> Result<User, AuthError> {
        let email = email.trim();
        if !credentials_plausible(email, password) {
            return Err(AuthError::InvalidCredentials);
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email: email.to_string(),
            avatar: Some(DEFAULT_AVATAR.to_string()),
        };
        let raw = serde_json::to_string(&user).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.store.set(SESSION_KEY, &raw)?;
        *self.current.write() = Some(user.clone());
        info!("👤 Signed in {}", user.email);
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.remove(SESSION_KEY)?;
        if let Some(user) = self.current.write().take() {
            info!("👋 Signed out {}", user.email);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_implausible_credentials() {
        let auth = AuthService::new(Arc::new(MemorySessionStore::default()));
        assert!(matches!(auth.login("no-at-sign", "secret123"), Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.login("a@b.c", "12345"), Err(AuthError::InvalidCredentials)));
        assert_eq!(auth.current(), None);
        assert_eq!(AuthError::InvalidCredentials.to_string(), INVALID_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn login_and_register_pick_display_names() {
        let auth = AuthService::new(Arc::new(MemorySessionStore::default()));
        assert_eq!(auth.login("a@b.c", "123456").unwrap().name, "设计师用户");
        assert_eq!(auth.register(Some("  "), "a@b.c", "123456").unwrap().name, "新用户");
        assert_eq!(auth.register(Some("小王"), "a@b.c", "123456").unwrap().name, "小王");
    }

    #[test]
    fn session_survives_restart_until_logout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let auth = AuthService::new(Arc::new(FileSessionStore::new(&path)));
        let user = auth.login("designer@example.com", "hunter22").unwrap();

        let restarted = AuthService::new(Arc::new(FileSessionStore::new(&path)));
        assert_eq!(restarted.current(), Some(user));

        restarted.logout().unwrap();
        assert_eq!(restarted.current(), None);
        let again = AuthService::new(Arc::new(FileSessionStore::new(&path)));
        assert_eq!(again.current(), None);
    }

    #[test]
    fn corrupt_record_is_discarded() {
        let store = Arc::new(MemorySessionStore::default());
        store.set(SESSION_KEY, "{not json").unwrap();
        assert_eq!(AuthService::new(store).current(), None);
    }
}
