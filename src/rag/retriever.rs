use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::embedding::{Embedder, HttpEmbedder};
use super::sqlite::SqliteChunkStore;
use super::store::{ChunkStore, StoredChunk, META_EMBEDDING_MODEL};
use crate::core::config::settings::EmbeddingSettings;
use crate::core::errors::RetrievalError;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` chunks nearest to the query, best first.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<StoredChunk>, RetrievalError>;
}

/// Embeds the query and runs a similarity search against a chunk store.
pub struct VectorRetriever {
    store: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(store: Arc<dyn ChunkStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Opens the persisted store if one exists. Returns `None` (and logs why)
    /// when there is no store or it cannot be opened, so callers fall back to
    /// the built-in answers.
    pub async fn open(store_dir: &Path, settings: &EmbeddingSettings) -> Option<Self> {
        if !SqliteChunkStore::exists(store_dir) {
            tracing::warn!(
                "No medical book database at {}; using built-in answers",
                store_dir.display()
            );
            return None;
        }

        let store = match SqliteChunkStore::open_existing(store_dir).await {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!("Error loading medical book database: {}", err);
                return None;
            }
        };

        let embedder = match HttpEmbedder::new(settings) {
            Ok(embedder) => embedder,
            Err(err) => {
                tracing::warn!("Failed to build embedding client: {}", err);
                return None;
            }
        };

        match store.get_meta(META_EMBEDDING_MODEL).await {
            Ok(Some(model)) if model != settings.model => tracing::warn!(
                "Store was built with embedding model '{}' but '{}' is configured; results may be poor",
                model,
                settings.model
            ),
            Ok(_) => {}
            Err(err) => tracing::debug!("Could not read store metadata: {}", err),
        }

        match store.count().await {
            Ok(count) => tracing::info!("Medical book loaded with {} chunks", count),
            Err(err) => tracing::warn!("Could not count stored chunks: {}", err),
        }

        Some(Self::new(Arc::new(store), Arc::new(embedder)))
    }

    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<StoredChunk>, RetrievalError> {
        let query_embedding = self.embedder.embed_query(query).await?;
        let results = self.store.search(&query_embedding, k).await?;
        Ok(results.into_iter().map(|r| r.chunk).collect())
    }
}
