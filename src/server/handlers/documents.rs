use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::utils::{find_session, UploadPayload};
use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(payload): Json<UploadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let session = find_session(&state, &session_id).await?;
    let bytes = payload.decode(state.sessions.max_upload_bytes())?;

    let report = state
        .sessions
        .ingest_upload(&session, &payload.file_name, &bytes)
        .await?;
    let summary = session.lock().await.summary();

    Ok(Json(json!({
        "document": report,
        "documents": summary.documents,
        "index_state": summary.index_state,
    })))
}

pub async fn reset_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let session = find_session(&state, &session_id).await?;
    state.sessions.reset_documents(&session).await;
    let index_state = session.lock().await.index().state();
    Ok(Json(json!({"index_state": index_state})))
}
