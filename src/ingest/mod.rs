//! Offline ingestion of the reference book into the chunk store.

pub mod chunker;
pub mod discovery;
pub mod pdf;
pub mod pipeline;

pub use chunker::{chunk_text, TextChunk};
pub use pipeline::{remove_store, IngestLock, IngestReport, Ingestor};
