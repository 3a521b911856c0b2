use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors raised while serving a study turn or managing a session's documents.
///
/// `Adapter` failures from optional context sources (documents, web, vision)
/// are absorbed by the orchestrator and surfaced as warnings; only the final
/// chat-model call can fail a turn.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{adapter} failed: {message}")]
    Adapter {
        adapter: &'static str,
        message: String,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

impl AssistantError {
    pub fn config(message: impl Into<String>) -> Self {
        AssistantError::Config(message.into())
    }

    pub fn adapter<E: std::fmt::Display>(adapter: &'static str, err: E) -> Self {
        AssistantError::Adapter {
            adapter,
            message: err.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AssistantError::Validation(message.into())
    }

    /// Short machine-readable kind, used in API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantError::Config(_) => "config",
            AssistantError::Adapter { .. } => "adapter",
            AssistantError::Validation(_) => "validation",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Validation(msg) => ApiError::BadRequest(msg),
            AssistantError::Config(msg) => ApiError::Internal(format!("configuration error: {msg}")),
            AssistantError::Adapter { .. } => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
