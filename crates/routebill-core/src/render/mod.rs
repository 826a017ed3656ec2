//! Invoice artifact production.

mod convert;
mod template;

pub use convert::{ArtifactConverter, LibreOfficeConverter};
pub use template::TemplateRenderer;

use std::path::{Path, PathBuf};

use crate::models::record::InvoiceDocument;

/// Produces a durable invoice artifact.
pub trait InvoiceRenderer: Send + Sync {
    /// Check that an invoice can be rendered at all, before any ledger write.
    fn validate(&self) -> crate::Result<()> {
        Ok(())
    }

    /// Render `invoice` into `output_dir`, returning the artifact path.
    ///
    /// The artifact must be fully written when this returns `Ok`.
    fn render(&self, invoice: &InvoiceDocument, output_dir: &Path) -> crate::Result<PathBuf>;
}
