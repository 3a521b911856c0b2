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
use crate::vision::{prepare_image, ImageLimits};

/// Attaches an image to the session's next turn.
pub async fn attach_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Json(payload): Json<UploadPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let session = find_session(&state, &session_id).await?;
    let limits = ImageLimits::from(&state.app_config.image);
    let bytes = payload.decode(limits.max_bytes)?;

    let file_name = payload.file_name.clone();
    let prepared =
        tokio::task::spawn_blocking(move || prepare_image(&bytes, Some(&file_name), limits))
            .await
            .map_err(ApiError::internal)??;
    let info = prepared.info();

    session.lock().await.attach_image(prepared);
    Ok(Json(json!({"image": info})))
}

pub async fn remove_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    let session = find_session(&state, &session_id).await?;
    let removed = session.lock().await.remove_image();
    Ok(Json(json!({"removed": removed})))
}
