//! Source document access.

mod extractor;

pub use extractor::PdfExtractor;

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern, glob_with};
use tracing::debug;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for page-oriented PDF access.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF, pages in order.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;
}

/// Supplies the plain text of a source document.
pub trait DocumentSource: Send + Sync {
    /// All text of the document at `path`, in page order.
    fn read_text(&self, path: &Path) -> crate::Result<String>;
}

/// Reads PDF files from disk with [`PdfExtractor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentSource;

impl DocumentSource for PdfDocumentSource {
    fn read_text(&self, path: &Path) -> crate::Result<String> {
        let data = std::fs::read(path)?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;
        Ok(extractor.extract_text()?)
    }
}

/// All `*.pdf` files below `dir`, recursively, sorted by path.
pub fn discover_documents(dir: &Path) -> crate::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("document directory not found: {}", dir.display()),
        )
        .into());
    }

    let pattern = format!("{}/**/*.pdf", Pattern::escape(&dir.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files: Vec<PathBuf> = glob_with(&pattern, options)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    debug!("Found {} documents in {}", files.len(), dir.display());
    Ok(files)
}
