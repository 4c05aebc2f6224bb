use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use medibook_backend::core::config::{AppPaths, ConfigService};
use medibook_backend::core::logging::{self, Component};
use medibook_backend::ingest::discovery::{find_pdfs, likely_books, parse_choice};
use medibook_backend::ingest::Ingestor;
use medibook_backend::rag::SqliteChunkStore;

fn prompt(question: &str) -> io::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn try_ingest(ingestor: &Ingestor, pdf: &Path, store_dir: &Path) -> bool {
    match ingestor.ingest_pdf(pdf, store_dir).await {
        Ok(report) => {
            println!(
                "Medical book setup complete: {} chunks from {}",
                report.stored, report.source
            );
            true
        }
        Err(err) => {
            tracing::error!("Failed to load {}: {}", pdf.display(), err);
            println!("Failed to load {}: {}", pdf.display(), err);
            false
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, Component::Setup);

    let settings = ConfigService::new(paths.clone())
        .settings()
        .context("Failed to load configuration")?;
    let store_dir = paths.resolve(&settings.store.dir);

    println!("Medical book setup");
    if SqliteChunkStore::exists(&store_dir) {
        println!("Medical book already loaded at {}", store_dir.display());
        return Ok(());
    }

    let ingestor = Ingestor::from_settings(&settings.embedding)
        .context("Failed to build embedding client")?;

    let cwd = env::current_dir().context("Failed to read working directory")?;
    let pdfs = find_pdfs(&cwd).context("Failed to list PDF files")?;

    if !pdfs.is_empty() {
        let names: Vec<_> = pdfs
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        println!("Found PDF files: {}", names.join(", "));

        for candidate in likely_books(&pdfs) {
            println!("Auto-selecting likely medical book: {}", candidate.display());
            if try_ingest(&ingestor, candidate, &store_dir).await {
                return Ok(());
            }
            println!("Trying next...");
        }

        println!("Which one is your medical book?");
        for (i, name) in names.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
        let answer = prompt(&format!(
            "Enter number (1-{}) or press Enter to skip: ",
            pdfs.len()
        ))?;
        if let Some(index) = parse_choice(&answer, pdfs.len()) {
            if try_ingest(&ingestor, &pdfs[index], &store_dir).await {
                return Ok(());
            }
        }
    }

    println!("No medical book found or selected.");
    let answer = prompt("Enter the full path to your medical book PDF (or press Enter to skip): ")?;
    let book = PathBuf::from(&answer);
    if !answer.is_empty() && book.is_file() {
        if !try_ingest(&ingestor, &book, &store_dir).await {
            println!("Failed to load the medical book.");
        }
    } else {
        println!("No book provided; the chatbot will use its built-in answers.");
        println!("Run this tool again to add a book later.");
    }

    Ok(())
}
