//! Activity report extraction.

pub mod dates;
mod extractor;
pub mod patterns;

pub use dates::week_of_year;
pub use extractor::ReportExtractor;

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
