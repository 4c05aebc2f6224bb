use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// A configuration document on disk that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal(err)
    }
}

/// Failures of the persisted chunk store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chunk store not found at {0}")]
    Missing(String),
    #[error("chunk store is locked by another writer: {0}")]
    Locked(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("embedding service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("embedding service returned {got} vectors for {expected} inputs")]
    Shape { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response had no content")]
    EmptyResponse,
}

impl LlmError {
    /// HTTP status reported by the provider, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            LlmError::Request(err) => err.status().map(|s| s.as_u16()),
            LlmError::EmptyResponse => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no API key configured")]
    Missing,
    #[error("API key does not have the expected `{0}` prefix")]
    BadFormat(&'static str),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("failed to extract text from PDF: {0}")]
    Extraction(String),
    #[error("only {0} characters extracted; the PDF might be scanned images")]
    TooLittleText(usize),
    #[error("no chunks produced from document")]
    NoChunks,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
