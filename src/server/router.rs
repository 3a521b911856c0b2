use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::AppConfig;
use crate::core::security::API_KEY_HEADER;
use crate::server::handlers::{config, documents, health, image, sessions, turns};
use crate::state::AppState;

/// Creates the application router.
///
/// Every `/api` handler checks the session token itself; `/health` is open.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.app_config);
    let body_limit = upload_body_limit(&state.app_config);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/config", get(config::get_config))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/:session_id/turns", post(turns::create_turn))
        .route(
            "/api/sessions/:session_id/messages",
            delete(sessions::clear_messages),
        )
        .route(
            "/api/sessions/:session_id/documents",
            post(documents::upload_document).delete(documents::reset_documents),
        )
        .route(
            "/api/sessions/:session_id/image",
            post(image::attach_image).delete(image::remove_image),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// Uploads travel as base64 inside JSON, so the body may be a third larger
/// than the largest accepted file.
fn upload_body_limit(config: &AppConfig) -> usize {
    let largest_mb = config.rag.max_file_size_mb.max(config.image.max_image_size_mb) as usize;
    largest_mb * 1024 * 1024 * 4 / 3 + 64 * 1024
}

fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = resolve_allowed_origins(&config.server.cors_allowed_origins)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(API_KEY_HEADER),
        ])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }
    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8501".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8501".to_string(),
    ]
}
