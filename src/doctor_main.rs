use std::sync::Arc;

use anyhow::Context;

use medibook_backend::core::config::settings::Settings;
use medibook_backend::core::config::{AppPaths, ConfigService};
use medibook_backend::core::logging::{self, Component};
use medibook_backend::llm::probe::select_model;
use medibook_backend::llm::{ApiKey, GroqClient};
use medibook_backend::rag::store::META_EMBEDDING_MODEL;
use medibook_backend::rag::{ChunkStore, Retriever, SqliteChunkStore, VectorRetriever};

const SAMPLE_QUERY: &str = "medical topics";
const SAMPLE_RESULTS: usize = 2;
const SAMPLE_PREVIEW_CHARS: usize = 200;

async fn check_store(paths: &AppPaths, settings: &Settings) {
    println!("Checking medical book database...");
    let store_dir = paths.resolve(&settings.store.dir);
    if !SqliteChunkStore::exists(&store_dir) {
        println!("  Database not found at {}", store_dir.display());
        println!("  Run medibook-setup to load a book.");
        return;
    }
    println!("  Database found at {}", store_dir.display());

    let Some(retriever) = VectorRetriever::open(&store_dir, &settings.embedding).await else {
        println!("  Database could not be opened; see the log for details.");
        return;
    };

    match retriever.store().count().await {
        Ok(count) => println!("  Chunks in database: {}", count),
        Err(err) => println!("  Failed to count chunks: {}", err),
    }
    match retriever.store().get_meta(META_EMBEDDING_MODEL).await {
        Ok(Some(model)) => println!("  Built with embedding model: {}", model),
        Ok(None) => println!("  Embedding model was not recorded"),
        Err(err) => println!("  Failed to read metadata: {}", err),
    }

    match retriever.retrieve(SAMPLE_QUERY, SAMPLE_RESULTS).await {
        Ok(chunks) => {
            println!("  Test search found {} chunks", chunks.len());
            if let Some(first) = chunks.first() {
                let preview: String = first.content.chars().take(SAMPLE_PREVIEW_CHARS).collect();
                println!("  Sample content: {}...", preview);
            }
        }
        Err(err) => println!("  Test search failed: {}", err),
    }
}

async fn check_hosted_model(settings: &Settings) {
    println!("Checking hosted model access...");
    let api_key = match ApiKey::resolve(settings.llm.api_key.as_deref()) {
        Ok(key) => {
            println!("  Valid API key found");
            key
        }
        Err(err) => {
            println!("  {}", err);
            return;
        }
    };

    let client = match GroqClient::new(&settings.llm, api_key) {
        Ok(client) => client,
        Err(err) => {
            println!("  Failed to build client: {}", err);
            return;
        }
    };

    let (selected, reports) =
        select_model(&client, &settings.llm.model_candidates, &settings.llm).await;
    for report in &reports {
        println!("  {} - {}", report.model, report.outcome);
    }
    match selected {
        Some(model) => println!("  Use this model: {}", model),
        None => println!("  All candidate models failed; check the provider's model list."),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, Component::Doctor);

    let settings = ConfigService::new(paths.clone())
        .settings()
        .context("Failed to load configuration")?;

    check_store(&paths, &settings).await;
    check_hosted_model(&settings).await;
    Ok(())
}
