use std::path::{Path, PathBuf};

const BOOK_KEYWORDS: [&str; 4] = ["medical", "book", "textbook", "medicine"];

/// Well-known name used by the reprocess tool.
pub const DEFAULT_BOOK_FILE: &str = "Medical_book.pdf";

/// PDF files directly inside `dir`, sorted by name.
pub fn find_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_pdf(path))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// PDFs whose names suggest a medical reference, in listing order.
pub fn likely_books(pdfs: &[PathBuf]) -> Vec<&PathBuf> {
    pdfs.iter()
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            BOOK_KEYWORDS.iter().any(|keyword| name.contains(keyword))
        })
        .collect()
}

/// Parses a 1-based menu choice. Blank or out-of-range input is `None`.
pub fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let index: usize = input.trim().parse().ok()?;
    (1..=count).contains(&index).then(|| index - 1)
}
