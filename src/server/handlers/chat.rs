use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;

use crate::state::AppState;

pub const EMPTY_MESSAGE_REPLY: &str = "Please enter a medical question.";
pub const FAILURE_REPLY: &str = "Please consult healthcare professionals for medical advice.";

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub status: String,
}

impl ChatReply {
    fn success(response: String) -> Self {
        Self {
            response,
            status: "success".to_string(),
        }
    }

    fn error(response: &str) -> Self {
        Self {
            response: response.to_string(),
            status: "error".to_string(),
        }
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> (StatusCode, Json<ChatReply>) {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::warn!("Rejected chat request: {}", rejection);
            return failure();
        }
    };

    let message = body.message.trim().to_string();
    if message.is_empty() {
        return (StatusCode::OK, Json(ChatReply::error(EMPTY_MESSAGE_REPLY)));
    }

    let responder = state.responder.clone();
    match run_isolated(async move { responder.respond(&message).await }).await {
        Ok(answer) => (StatusCode::OK, Json(ChatReply::success(answer))),
        Err(err) => {
            tracing::error!("Responder task failed: {}", err);
            failure()
        }
    }
}

/// Runs the answer on its own task so a panic becomes an error value
/// instead of tearing down the connection.
async fn run_isolated<F>(answer: F) -> Result<String, JoinError>
where
    F: Future<Output = String> + Send + 'static,
{
    tokio::spawn(answer).await
}

fn failure() -> (StatusCode, Json<ChatReply>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ChatReply::error(FAILURE_REPLY)),
    )
}
