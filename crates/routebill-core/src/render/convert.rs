//! Conversion of a rendered table into a distributable document.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::RenderError;

/// Turns a rendered table file into the final artifact.
pub trait ArtifactConverter: Send + Sync {
    /// Convert `input`, writing the result into `output_dir`.
    fn convert(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, RenderError>;
}

/// Converts to PDF with a headless LibreOffice.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    binary: String,
}

impl LibreOfficeConverter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl ArtifactConverter for LibreOfficeConverter {
    fn convert(&self, input: &Path, output_dir: &Path) -> Result<PathBuf, RenderError> {
        let output = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(output_dir)
            .arg(input)
            .output()
            .map_err(|e| RenderError::Conversion(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(RenderError::Conversion(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stem = input
            .file_stem()
            .ok_or_else(|| RenderError::Conversion(format!("no file name: {}", input.display())))?;
        let pdf = output_dir.join(format!("{}.pdf", stem.to_string_lossy()));
        if !pdf.is_file() {
            return Err(RenderError::Conversion(format!(
                "{} reported success but {} is missing",
                self.binary,
                pdf.display()
            )));
        }

        debug!("Converted {} to {}", input.display(), pdf.display());
        Ok(pdf)
    }
}
