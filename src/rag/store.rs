//! ChunkStore trait — abstract interface for the persisted vector store.
//!
//! The server only reads from a store; ingestion tools write to it. The
//! implementation lives in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::StoreError;

pub const META_EMBEDDING_MODEL: &str = "embedding_model";
pub const META_INGESTED_AT: &str = "ingested_at";
pub const META_SOURCE: &str = "source";

/// A stored chunk of the reference text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Hex SHA-256 of `content`.
    pub chunk_id: String,
    pub content: String,
    /// Source document name.
    pub source: String,
    /// Disease heading the chunk was cut under, if any.
    pub heading: Option<String>,
    /// Position of the chunk within its source.
    pub ordinal: i64,
}

impl StoredChunk {
    pub fn new(content: String, source: &str, heading: Option<String>, ordinal: i64) -> Self {
        Self {
            chunk_id: content_id(&content),
            content,
            source: source.to_string(),
            heading,
            ordinal,
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert chunks with their embedding vectors in one transaction.
    /// Chunks with an existing id are replaced.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<usize, StoreError>;

    /// Nearest chunks to the query embedding, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

pub fn content_id(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
