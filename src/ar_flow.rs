use std::{sync::Arc, time::Duration};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn, error};
use uuid::Uuid;

use crate::{
    adapter,
    attempt::{guarded, AbandonGuard, Attempt},
    error::{FlowError, AR_FAILURE_MESSAGE, CONFIG_ERROR_MESSAGE},
    gemini::GenerativeService,
    models::{ArRequest, ArResult},
    parsing::parse_source_image,
};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArStatus {
    Idle,
    Processing,
    Ready,
    Failed,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArSnapshot {
    pub status: ArStatus,
    pub source_image: Option<String>,
    pub history: Vec<ArResult>,
    pub selected_id: Option<Uuid>,
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    source_image: Option<String>,
    history: Vec<ArResult>,
    selected: Option<Uuid>,
    status: Option<ArStatus>,
    error: Option<String>,
    attempt: Option<Attempt>,
}

impl Inner {
    fn cancel_attempt(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            attempt.token.cancel();
        }
    }
}

/// Photo makeover workflow: edit and analysis run concurrently and land as
/// one history entry, or not at all.
pub struct ArOrchestrator {
    service: Arc<dyn GenerativeService>,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl ArOrchestrator {
    pub fn new(service: Arc<dyn GenerativeService>, timeout: Duration) -> Self {
        Self { service, timeout, inner: Mutex::new(Inner::default()) }
    }

    pub fn snapshot(&self) -> ArSnapshot {
        let inner = self.inner.lock();
        ArSnapshot {
            status: inner.status.unwrap_or(ArStatus::Idle),
            source_image: inner.source_image.clone(),
            history: inner.history.clone(),
            selected_id: inner.selected,
            error: inner.error.clone(),
        }
    }

    pub fn has_results(&self) -> bool {
        !self.inner.lock().history.is_empty()
    }

    /// A new upload starts a new session: history and selection are cleared.
    pub fn set_source_image(&self, image: &str) -> Result<(), FlowError> {
        parse_source_image(image)?;
        let mut inner = self.inner.lock();
        inner.cancel_attempt();
        inner.source_image = Some(image.trim().to_string());
        inner.history.clear();
        inner.selected = None;
        inner.status = Some(ArStatus::Idle);
        inner.error = None;
        info!("📷 New source image uploaded, AR history cleared");
        Ok(())
    }

    pub fn select(&self, id: Uuid) -> Option<ArResult> {
        let mut inner = self.inner.lock();
        let found = inner.history.iter().find(|r| r.id == id).cloned()?;
        inner.selected = Some(id);
        Some(found)
    }

    pub fn active(&self) -> Option<ArResult> {
        let inner = self.inner.lock();
        let id = inner.selected?;
        inner.history.iter().find(|r| r.id == id).cloned()
    }

    pub fn reset_all(&self) {
        let mut inner = self.inner.lock();
        inner.cancel_attempt();
        *inner = Inner::default();
        info!("🔄 AR session reset");
    }

    /// The caller dropped `generate` before both calls returned. A still-live
    /// attempt is cancelled and reported as failed; history is untouched.
    fn abandon(&self, id: Uuid) {
        let mut inner = self.inner.lock();
        if !inner.attempt.as_ref().is_some_and(|a| a.is_live(id)) {
            return;
        }
        inner.cancel_attempt();
        inner.status = Some(ArStatus::Failed);
        inner.error = Some(AR_FAILURE_MESSAGE.to_string());
        warn!("🛑 AR generation {} abandoned by its caller", id);
    }

    pub async fn generate(&self, request: ArRequest) -> Result<ArResult, FlowError> {
        let source = parse_source_image(&request.source_image)?;
        let original = request.source_image.trim().to_string();

        let (id, token) = {
            let mut inner = self.inner.lock();
            if inner.source_image.as_deref() != Some(original.as_str()) {
                inner.history.clear();
                inner.selected = None;
                inner.source_image = Some(original.clone());
            }
            inner.cancel_attempt();
            let attempt = Attempt::start();
            let handle = (attempt.id, attempt.token.clone());
            inner.attempt = Some(attempt);
            inner.status = Some(ArStatus::Processing);
            inner.error = None;
            handle
        };
        info!("🚀 AR generation {} started: {} / {}", id, request.style, request.focus_area.label());

        let service = self.service.as_ref();
        let calls = async {
            let (edited, analysis) = tokio::join!(
                adapter::renovate_room(service, &source, &request.style, request.focus_area),
                adapter::analyze_room(service, &source, &request.style, request.focus_area),
            );
            Ok::<_, FlowError>((edited?, analysis))
        };

        let guard = AbandonGuard::new(|| self.abandon(id));
        let outcome = guarded(&token, self.timeout, calls).await;
        guard.disarm();

        let mut inner = self.inner.lock();
        if !inner.attempt.as_ref().is_some_and(|a| a.is_live(id)) {
            warn!("⏭️ AR generation {} superseded, discarding its results", id);
            return Err(FlowError::Superseded);
        }
        inner.attempt = None;

        match outcome {
            Ok((generated_image, analysis)) => {
                if generated_image.is_none() {
                    warn!("⚠️ AR generation {} produced no edited image", id);
                }
                let result = ArResult {
                    id,
                    timestamp: Utc::now(),
                    style: request.style,
                    focus_area: request.focus_area,
                    original_image: original,
                    generated_image,
                    analysis: analysis.analysis,
                    degraded: analysis.degraded,
                };
                inner.history.insert(0, result.clone());
                inner.selected = Some(id);
                inner.status = Some(ArStatus::Ready);
                info!("✅ AR generation {} added to history ({} entries)", id, inner.history.len());
                Ok(result)
            }
            Err(e) => {
                error!("❌ AR generation {} failed: {}", id, e);
                let message = if e.is_configuration() { CONFIG_ERROR_MESSAGE } else { AR_FAILURE_MESSAGE };
                inner.status = Some(ArStatus::Failed);
                inner.error = Some(message.to_string());
                Err(e)
            }
        }
    }
}
