use base64::Engine as _;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::session::manager::SharedSession;
use crate::state::AppState;

/// JSON upload body shared by the document and image endpoints.
#[derive(Debug, Deserialize)]
pub struct UploadPayload {
    pub file_name: String,
    pub content_base64: String,
}

impl UploadPayload {
    /// Decodes the content, rejecting anything larger than `max_bytes`.
    pub fn decode(&self, max_bytes: u64) -> Result<Vec<u8>, ApiError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.content_base64.trim())
            .map_err(|e| ApiError::BadRequest(format!("content_base64 is not valid base64: {}", e)))?;
        if bytes.len() as u64 > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "{} is {} bytes, limit is {} bytes",
                self.file_name,
                bytes.len(),
                max_bytes
            )));
        }
        Ok(bytes)
    }
}

pub async fn find_session(state: &AppState, session_id: &str) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}
