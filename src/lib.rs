//! SmartDeco: AI interior design assistant.
//!
//! The design flow renders a room from parameters and prices a furniture list;
//! the AR flow restyles an uploaded photo and analyzes what is in it. Both run
//! against a [`gemini::GenerativeService`] injected at construction.

pub mod adapter;
pub mod ar_flow;
mod attempt;
pub mod auth;
pub mod config;
pub mod design_flow;
pub mod error;
pub mod gemini;
pub mod models;
pub mod parsing;
pub mod presentation;
pub mod prompts;
pub mod routes;
pub mod slider;
pub mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use crate::{
    ar_flow::ArOrchestrator,
    auth::{AuthService, SessionStore},
    config::Config,
    design_flow::DesignOrchestrator,
    gemini::{GeminiClient, GenerativeService, UnconfiguredService},
    routes::AppState,
};

/// Builds the shared state from config. A missing credential is reported once
/// here; generations then fail with the configuration message without any request.
pub fn build_state(config: &Config, sessions: Arc<dyn SessionStore>) -> AppState {
    let (service, configured): (Arc<dyn GenerativeService>, bool) = match GeminiClient::from_config(config) {
        Ok(client) => {
            tracing::info!("🔑 Gemini client ready: {:?}", client);
            (Arc::new(client), true)
        }
        Err(e) => {
            tracing::error!("❌ {} (set GEMINI_API_KEY); generation requests will fail", e);
            (Arc::new(UnconfiguredService), false)
        }
    };
    state_with_service(service, config, sessions, configured)
}

pub fn state_with_service(
    service: Arc<dyn GenerativeService>,
    config: &Config,
    sessions: Arc<dyn SessionStore>,
    configured: bool,
) -> AppState {
    AppState {
        design: Arc::new(DesignOrchestrator::new(service.clone(), config.generation_timeout)),
        ar: Arc::new(ArOrchestrator::new(service, config.generation_timeout)),
        auth: Arc::new(AuthService::new(sessions)),
        configured,
    }
}
