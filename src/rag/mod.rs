//! Retrieval over the persisted reference-text store.
//!
//! - `store`: the `ChunkStore` trait and chunk types
//! - `sqlite`: SQLite implementation with cosine ranking
//! - `embedding`: HTTP sentence-embedding client
//! - `retriever`: query embedding plus similarity search

pub mod embedding;
pub mod retriever;
pub mod sqlite;
pub mod store;

pub use embedding::{Embedder, HttpEmbedder};
pub use retriever::{Retriever, VectorRetriever};
pub use sqlite::SqliteChunkStore;
pub use store::{ChunkSearchResult, ChunkStore, StoredChunk};
