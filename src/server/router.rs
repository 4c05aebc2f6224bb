use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, config, health, page};
use crate::state::AppState;

/// Builds the application router: the chat page, the chat endpoint and the
/// status endpoints, wrapped in CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/", get(page::index))
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/api/config", get(config::get_config))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(
        &state.settings.server.cors_allowed_origins,
        state.settings.server.port,
    )
    .into_iter()
    .filter_map(|origin| HeaderValue::from_str(&origin).ok())
    .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(configured: &[String], port: u16) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins(port);
    }

    origins
}

fn default_local_origins(port: u16) -> Vec<String> {
    vec![
        format!("http://localhost:{}", port),
        format!("http://127.0.0.1:{}", port),
        "http://localhost".to_string(),
        "http://127.0.0.1".to_string(),
    ]
}
