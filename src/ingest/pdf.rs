use std::path::{Path, PathBuf};

use crate::core::errors::IngestError;

/// Below this the PDF is most likely scanned page images.
pub const MIN_EXTRACTED_CHARS: usize = 100;

/// Extracts the text layer of a PDF. Runs on the blocking pool since
/// extraction of a full textbook takes a while.
pub async fn extract_text(path: &Path) -> Result<String, IngestError> {
    if !path.is_file() {
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    tracing::info!("Loading medical book: {}", path.display());
    let owned: PathBuf = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| IngestError::Extraction(e.to_string()))?
        .map_err(|e| IngestError::Extraction(e.to_string()))?;

    let extracted = text.chars().count();
    tracing::info!("Extracted {} characters from {}", extracted, path.display());
    ensure_enough_text(&text)?;
    Ok(text)
}

pub fn ensure_enough_text(text: &str) -> Result<(), IngestError> {
    let extracted = text.chars().count();
    if extracted < MIN_EXTRACTED_CHARS {
        return Err(IngestError::TooLittleText(extracted));
    }
    Ok(())
}
