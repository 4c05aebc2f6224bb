//! Turns a document into an embedded, persisted chunk store.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use serde::Serialize;

use super::chunker::{chunk_text, TextChunk};
use super::pdf::{ensure_enough_text, extract_text};
use crate::core::config::settings::EmbeddingSettings;
use crate::core::errors::{EmbeddingError, IngestError, StoreError};
use crate::rag::store::{META_EMBEDDING_MODEL, META_INGESTED_AT, META_SOURCE};
use crate::rag::{ChunkStore, Embedder, HttpEmbedder, SqliteChunkStore, StoredChunk};

const LOCK_FILE: &str = ".ingest.lock";

/// Exclusive advisory lock on a store directory, held for the duration of
/// one ingestion. Released on drop.
pub struct IngestLock {
    file: File,
    path: PathBuf,
}

impl IngestLock {
    pub fn acquire(store_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(store_dir)?;
        let path = store_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| StoreError::Locked(store_dir.display().to_string()))?;
        Ok(Self { file, path })
    }
}

impl Drop for IngestLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::debug!("Failed to release {}: {}", self.path.display(), err);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub extracted_chars: usize,
    pub chunks: usize,
    pub stored: usize,
    pub embedding_model: String,
    pub store_path: PathBuf,
}

pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Ingestor backed by the configured HTTP embedding service.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let embedder = HttpEmbedder::new(settings)?;
        Ok(Self::new(Arc::new(embedder), settings.batch_size))
    }

    pub async fn ingest_pdf(
        &self,
        pdf: &Path,
        store_dir: &Path,
    ) -> Result<IngestReport, IngestError> {
        let text = extract_text(pdf).await?;
        let source = pdf
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| pdf.display().to_string());
        self.ingest_text(&text, &source, store_dir).await
    }

    pub async fn ingest_text(
        &self,
        text: &str,
        source: &str,
        store_dir: &Path,
    ) -> Result<IngestReport, IngestError> {
        ensure_enough_text(text)?;
        let _lock = IngestLock::acquire(store_dir)?;

        tracing::info!("Splitting into disease-specific chunks...");
        let chunks = chunk_text(text);
        if chunks.is_empty() {
            return Err(IngestError::NoChunks);
        }
        tracing::info!("Created {} searchable knowledge chunks", chunks.len());
        for chunk in chunks.iter().take(3) {
            let preview: String = chunk.content.chars().take(50).collect();
            tracing::debug!("Sample chunk: {}...", preview);
        }

        let store = SqliteChunkStore::create_staging(store_dir).await?;
        let written = self.write_chunks(&store, &chunks, source).await;
        store.close().await;
        let stored = match written {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(cleanup) = SqliteChunkStore::discard_staging(store_dir) {
                    tracing::warn!("Failed to discard partial store: {}", cleanup);
                }
                return Err(err);
            }
        };
        SqliteChunkStore::promote_staging(store_dir)?;

        tracing::info!("Medical book loaded: {} chunks stored", stored);
        Ok(IngestReport {
            source: source.to_string(),
            extracted_chars: text.chars().count(),
            chunks: chunks.len(),
            stored,
            embedding_model: self.embedder.model().to_string(),
            store_path: SqliteChunkStore::db_path(store_dir),
        })
    }

    /// Embeds and inserts every chunk, then records the store metadata.
    async fn write_chunks(
        &self,
        store: &SqliteChunkStore,
        chunks: &[TextChunk],
        source: &str,
    ) -> Result<usize, IngestError> {
        let total_batches = chunks.len().div_ceil(self.batch_size);
        let mut stored = 0;

        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let inputs: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed(&inputs).await?;
            if vectors.len() != inputs.len() {
                return Err(EmbeddingError::Shape {
                    expected: inputs.len(),
                    got: vectors.len(),
                }
                .into());
            }

            let offset = batch_no * self.batch_size;
            let items = batch
                .iter()
                .enumerate()
                .zip(vectors)
                .map(|((i, chunk), vector)| {
                    let stored_chunk = StoredChunk::new(
                        chunk.content.clone(),
                        source,
                        chunk.heading.clone(),
                        (offset + i) as i64,
                    );
                    (stored_chunk, vector)
                })
                .collect();
            stored += store.insert_batch(items).await?;
            tracing::info!("Embedded batch {}/{}", batch_no + 1, total_batches);
        }

        store
            .set_meta(META_EMBEDDING_MODEL, self.embedder.model())
            .await?;
        store
            .set_meta(META_INGESTED_AT, &chrono::Utc::now().to_rfc3339())
            .await?;
        store.set_meta(META_SOURCE, source).await?;
        Ok(stored)
    }
}

/// Deletes a store directory. Returns whether anything was removed.
pub fn remove_store(store_dir: &Path) -> Result<bool, StoreError> {
    if !store_dir.exists() {
        return Ok(false);
    }
    let _lock = IngestLock::acquire(store_dir)?;
    std::fs::remove_dir_all(store_dir)?;
    Ok(true)
}
