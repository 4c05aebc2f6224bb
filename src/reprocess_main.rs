use std::env;
use std::sync::Arc;

use anyhow::Context;

use medibook_backend::core::config::{AppPaths, ConfigService};
use medibook_backend::core::logging::{self, Component};
use medibook_backend::ingest::discovery::DEFAULT_BOOK_FILE;
use medibook_backend::ingest::{remove_store, Ingestor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, Component::Reprocess);

    let settings = ConfigService::new(paths.clone())
        .settings()
        .context("Failed to load configuration")?;
    let store_dir = paths.resolve(&settings.store.dir);

    if remove_store(&store_dir)
        .with_context(|| format!("Failed to remove {}", store_dir.display()))?
    {
        println!("Removed old database at {}", store_dir.display());
    }

    let book = env::current_dir()
        .context("Failed to read working directory")?
        .join(DEFAULT_BOOK_FILE);
    println!("Reprocessing {}", book.display());

    let ingestor = Ingestor::from_settings(&settings.embedding)
        .context("Failed to build embedding client")?;
    let report = ingestor
        .ingest_pdf(&book, &store_dir)
        .await
        .with_context(|| format!("Failed to process {}", book.display()))?;

    println!(
        "Reprocessed {}: {} characters, {} chunks stored in {}",
        report.source,
        report.extracted_chars,
        report.stored,
        report.store_path.display()
    );
    Ok(())
}
