//! SQLite-backed chunk store.
//!
//! Chunk text and metadata live in SQLite; search is a brute-force cosine
//! ranking over every stored embedding.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, ChunkStore, StoredChunk};
use crate::core::errors::StoreError;

const DB_FILE: &str = "chunks.db";
const STAGING_FILE: &str = "chunks.db.partial";

pub struct SqliteChunkStore {
    pool: SqlitePool,
}

impl SqliteChunkStore {
    /// Database file inside a store directory.
    pub fn db_path(store_dir: &Path) -> PathBuf {
        store_dir.join(DB_FILE)
    }

    pub fn exists(store_dir: &Path) -> bool {
        Self::db_path(store_dir).is_file()
    }

    /// Database file an ingestion writes into before it is promoted.
    pub fn staging_path(store_dir: &Path) -> PathBuf {
        store_dir.join(STAGING_FILE)
    }

    /// Fresh writable database at the staging path. Leftovers from an
    /// interrupted ingestion are discarded first.
    pub async fn create_staging(store_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(store_dir)?;
        Self::discard_staging(store_dir)?;
        Self::connect_writable(&Self::staging_path(store_dir)).await
    }

    /// Replaces the live database with the staged one. The staged pool must
    /// be closed first.
    pub fn promote_staging(store_dir: &Path) -> Result<(), StoreError> {
        std::fs::rename(Self::staging_path(store_dir), Self::db_path(store_dir))?;
        Ok(())
    }

    pub fn discard_staging(store_dir: &Path) -> Result<(), StoreError> {
        let staging = Self::staging_path(store_dir);
        let mut journal = staging.clone().into_os_string();
        journal.push("-journal");
        for path in [staging, PathBuf::from(journal)] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn connect_writable(db_path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Opens an existing store read-only. Fails with `StoreError::Missing`
    /// when nothing has been ingested yet.
    pub async fn open_existing(store_dir: &Path) -> Result<Self, StoreError> {
        let db_path = Self::db_path(store_dir);
        if !db_path.is_file() {
            return Err(StoreError::Missing(db_path.display().to_string()));
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                heading TEXT,
                ordinal INTEGER NOT NULL DEFAULT 0,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            heading: row.get("heading"),
            ordinal: row.get("ordinal"),
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<usize, StoreError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            sqlx::query(
                "INSERT OR REPLACE INTO chunks (chunk_id, content, source, heading, ordinal, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(&chunk.heading)
            .bind(chunk.ordinal)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(items.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, StoreError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, source, heading, ordinal, embedding
             FROM chunks",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<ChunkSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                Some(ChunkSearchResult {
                    chunk: Self::row_to_chunk(row),
                    score: cosine_similarity(query_embedding, &stored),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit.max(1));

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                 updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::META_EMBEDDING_MODEL;

    fn make_chunk(content: &str, ordinal: i64) -> StoredChunk {
        StoredChunk::new(content.to_string(), "book.pdf", None, ordinal)
    }

    #[tokio::test]
    async fn insert_and_search_ranks_by_cosine() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteChunkStore::create_staging(tmp.path()).await.unwrap();

        let inserted = store
            .insert_batch(vec![
                (make_chunk("Diabetes affects insulin.", 0), vec![1.0, 0.0, 0.0]),
                (make_chunk("Asthma affects the lungs.", 1), vec![0.0, 1.0, 0.0]),
                (make_chunk("Mixed topic.", 2), vec![0.7, 0.7, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "Diabetes affects insulin.");
        assert!(results[0].score > 0.99);
        assert_eq!(results[1].chunk.content, "Mixed topic.");
    }

    #[tokio::test]
    async fn reinserting_identical_content_replaces() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteChunkStore::create_staging(tmp.path()).await.unwrap();

        store
            .insert_batch(vec![(make_chunk("Same text", 0), vec![1.0])])
            .await
            .unwrap();
        store
            .insert_batch(vec![(make_chunk("Same text", 5), vec![1.0])])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn open_existing_reads_what_create_wrote() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!SqliteChunkStore::exists(tmp.path()));
        assert!(matches!(
            SqliteChunkStore::open_existing(tmp.path()).await,
            Err(StoreError::Missing(_))
        ));

        {
            let store = SqliteChunkStore::create_staging(tmp.path()).await.unwrap();
            store
                .insert_batch(vec![(make_chunk("Heart disease text", 0), vec![0.5, 0.5])])
                .await
                .unwrap();
            store
                .set_meta(META_EMBEDDING_MODEL, "mini-lm")
                .await
                .unwrap();
            store.close().await;
        }
        assert!(!SqliteChunkStore::exists(tmp.path()));
        SqliteChunkStore::promote_staging(tmp.path()).unwrap();
        assert!(!SqliteChunkStore::staging_path(tmp.path()).exists());

        let reader = SqliteChunkStore::open_existing(tmp.path()).await.unwrap();
        assert_eq!(reader.count().await.unwrap(), 1);
        assert_eq!(
            reader.get_meta(META_EMBEDDING_MODEL).await.unwrap().as_deref(),
            Some("mini-lm")
        );
        assert_eq!(reader.get_meta("missing").await.unwrap(), None);
    }

    #[test]
    fn cosine_similarity_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
