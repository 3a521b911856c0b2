use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::utils::find_session;
use crate::context::{ResponseMode, TurnFlags, TurnReply};
use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TurnPayload {
    pub query: String,
    #[serde(default)]
    pub use_rag: bool,
    #[serde(default)]
    pub use_web_search: bool,
    #[serde(default)]
    pub response_mode: ResponseMode,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Runs one study turn. A failed chat call still answers 200: the turn is
/// recorded and the reply carries the error text.
pub async fn create_turn(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(payload): Json<TurnPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let session = find_session(&state, &session_id).await?;
    // The default provider is checked at startup, so a failure here is the caller's.
    let orchestrator = state
        .orchestrator(payload.provider.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let flags = TurnFlags {
        use_rag: payload.use_rag,
        use_web_search: payload.use_web_search,
    };
    let outcome = session
        .lock()
        .await
        .run_turn(
            &orchestrator,
            state.sessions.embedder(),
            &payload.query,
            flags,
            payload.response_mode,
        )
        .await?;

    let error_kind = match &outcome.reply {
        TurnReply::Answer(_) => None,
        TurnReply::Failed { error, .. } => Some(error.kind()),
    };
    let status = if error_kind.is_some() { "error" } else { "ok" };
    let sources: Vec<&str> = outcome.fragments.iter().map(|f| f.source.as_str()).collect();

    Ok(Json(json!({
        "reply": outcome.reply.text(),
        "status": status,
        "error_kind": error_kind,
        "warnings": outcome.warnings,
        "features_used": outcome.features,
        "context_sources": sources,
    })))
}
