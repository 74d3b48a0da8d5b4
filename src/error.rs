use std::time::Duration;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

use crate::{gemini::GeminiError, parsing::ParseError, state::TransitionError};

pub const CONFIG_ERROR_MESSAGE: &str = "配置错误: 缺少 API Key。请在部署设置中配置环境变量。";
pub const GENERATION_ERROR_MESSAGE: &str = "抱歉，生成方案时遇到了一些问题。请稍后重试。";
pub const AR_FAILURE_MESSAGE: &str = "生成失败，请重试";

/// Why a generation attempt did not complete.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("generation failed: {0}")]
    Generation(#[source] GeminiError),
    #[error("invalid service response: {0}")]
    Parse(#[from] ParseError),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("superseded by a newer request")]
    Superseded,
    #[error("caller stopped waiting before the generation finished")]
    Abandoned,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<GeminiError> for FlowError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingCredential => FlowError::Configuration(err.to_string()),
            other => FlowError::Generation(other),
        }
    }
}

impl FlowError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, FlowError::Configuration(_))
    }

    /// Localized message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        if self.is_configuration() { CONFIG_ERROR_MESSAGE } else { GENERATION_ERROR_MESSAGE }
    }
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("not logged in")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
