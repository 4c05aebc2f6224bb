use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let chunks = match &state.store {
        Some(store) => match store.count().await {
            Ok(count) => Some(count),
            Err(err) => {
                tracing::warn!("Failed to count stored chunks: {}", err);
                None
            }
        },
        None => None,
    };

    Ok(Json(json!({
        "store": {
            "available": state.store.is_some(),
            "chunks": chunks,
            "path": state.store_dir().display().to_string(),
        },
        "model": state.responder.model(),
        "embedding_model": state.settings.embedding.model,
        "emergency_match_mode": state.settings.emergency.match_mode,
    })))
}
