//! Error types for the routebill-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the routebill library.
#[derive(Error, Debug)]
pub enum BillingError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Report extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Ledger or template schema error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Invoice rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CSV codec error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// A required fact could not be read from an activity report.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No report date label in the document.
    #[error("{document}: report date not found")]
    MissingDate { document: String },

    /// No successful-stops label in the document.
    #[error("{document}: total successful stops not found")]
    MissingStops { document: String },

    /// Report date present but not a valid calendar date.
    #[error("{document}: invalid report date {value:?}")]
    InvalidDate { document: String, value: String },

    /// Stop count present but out of range.
    #[error("{document}: invalid stop count {value:?}")]
    InvalidStops { document: String, value: String },
}

/// The ledger (or a template) does not have the expected shape.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A required header is absent.
    #[error("{path}: missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// The table has no header row at all.
    #[error("{path}: no header row")]
    NoHeader { path: PathBuf },

    /// A cell could not be interpreted as its column's type.
    #[error("{path}: row {row}, column {column:?}: invalid value {value:?}")]
    InvalidCell {
        path: PathBuf,
        row: usize,
        column: &'static str,
        value: String,
    },

    /// An invoice ref in the ledger matches the numbering format but cannot be continued.
    #[error("invoice number {value:?}: {reason}")]
    InvoiceRef { value: String, reason: &'static str },
}

/// Invoice artifact production failed.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Template is unusable.
    #[error("template {path}: {reason}")]
    Template { path: PathBuf, reason: String },

    /// Writing the artifact failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document converter failed.
    #[error("conversion failed: {0}")]
    Conversion(String),
}

/// Invalid configuration, detected at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A numeric option is out of range.
    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },

    /// A format string does not contain exactly one `{number}` placeholder.
    #[error("{field} must contain exactly one {{number}} placeholder: {value:?}")]
    BadFormat { field: &'static str, value: String },

    /// The start invoice number does not match the numbering format.
    #[error("start invoice number {start:?} does not match format {format:?}")]
    StartMismatch { start: String, format: String },

    /// The configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for the routebill library.
pub type Result<T> = std::result::Result<T, BillingError>;
