use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::core::errors::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
const TOKEN_ENV: &str = "STUDY_COMPANION_SESSION_TOKEN";

#[derive(Debug, Clone)]
pub struct SessionToken {
    value: String,
}

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Uses `STUDY_COMPANION_SESSION_TOKEN` when set, otherwise mints a token and
/// writes it to `<data_dir>/.session_token` for local clients to pick up.
pub fn init_session_token(data_dir: &Path) -> SessionToken {
    if let Ok(token) = env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return SessionToken::new(token);
        }
    }

    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let token_path = session_token_path(data_dir);
    if let Some(parent) = token_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Err(err) = fs::write(&token_path, &token) {
        tracing::warn!("Failed to write session token: {}", err);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(&token_path) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            let _ = fs::set_permissions(&token_path, perms);
        }
    }

    SessionToken::new(token)
}

pub fn session_token_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".session_token")
}

pub fn require_api_key(headers: &HeaderMap, expected: &SessionToken) -> Result<(), ApiError> {
    let header_value = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if header_value.is_empty() || header_value != expected.value() {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn only_the_exact_token_is_accepted() {
        let expected = SessionToken::new("secret");
        let cases: [(Option<HeaderValue>, bool); 4] = [
            (Some(HeaderValue::from_static("secret")), true),
            (Some(HeaderValue::from_static("Secret")), false),
            (Some(HeaderValue::from_bytes(&[0xFF, 0xFE]).expect("opaque bytes")), false),
            (None, false),
        ];

        for (value, accepted) in cases {
            let mut headers = HeaderMap::new();
            if let Some(value) = value {
                headers.insert(API_KEY_HEADER, value);
            }
            let result = require_api_key(&headers, &expected);
            assert_eq!(result.is_ok(), accepted);
            if !accepted {
                assert!(matches!(result, Err(ApiError::Unauthorized)));
            }
        }
    }

    #[test]
    fn minted_token_is_written_for_local_clients() {
        if env::var(TOKEN_ENV).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().expect("tempdir");

        let token = init_session_token(dir.path());

        let path = session_token_path(dir.path());
        assert_eq!(fs::read_to_string(&path).expect("token file"), token.value());
        assert_eq!(token.value().len(), 64);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
