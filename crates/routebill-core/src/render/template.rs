//! Placeholder substitution into a tabular invoice template.
//!
//! Scalar placeholders look like `${invoiceNumber}`. A row holding
//! `${table:records.<field>}` placeholders is repeated once per invoice line,
//! with `weekOfYear`, `hours`, `price` and `total` available as fields.

use std::path::{Path, PathBuf};

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use super::{ArtifactConverter, InvoiceRenderer};
use crate::error::{BillingError, RenderError, SchemaError};
use crate::models::config::BillingConfig;
use crate::models::record::{BillingRecord, InvoiceDocument};
use crate::numbering::NUMBER_PLACEHOLDER;
use crate::table::Table;

const RECORDS_MARKER: &str = "${table:records.";

/// Renders invoices from a CSV template.
pub struct TemplateRenderer {
    template_path: PathBuf,
    file_name_format: String,
    converter: Option<Box<dyn ArtifactConverter>>,
}

impl TemplateRenderer {
    /// Create a renderer; artifact names come from `file_name_format`.
    pub fn new(template_path: impl Into<PathBuf>, file_name_format: impl Into<String>) -> Self {
        Self {
            template_path: template_path.into(),
            file_name_format: file_name_format.into(),
            converter: None,
        }
    }

    /// Create a renderer from the pipeline configuration.
    pub fn from_config(template_path: impl Into<PathBuf>, config: &BillingConfig) -> Self {
        let renderer = Self::new(template_path, &config.numbering.invoice_file_name_format);
        if config.render.convert_to_pdf {
            renderer.with_converter(Box::new(super::LibreOfficeConverter::new(
                &config.render.converter_binary,
            )))
        } else {
            renderer
        }
    }

    /// Convert the rendered table into a final document.
    pub fn with_converter(mut self, converter: Box<dyn ArtifactConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Read the template and check it has a `records` row.
    fn load_template(&self) -> crate::Result<Table> {
        let template = Table::read(&self.template_path).map_err(|e| RenderError::Template {
            path: self.template_path.clone(),
            reason: e.to_string(),
        })?;

        if !template.rows.iter().any(|row| is_records_row(row)) {
            return Err(SchemaError::MissingColumn {
                path: self.template_path.clone(),
                column: "records",
            }
            .into());
        }
        Ok(template)
    }

    /// Substitute `invoice` into the template table.
    pub fn fill(&self, invoice: &InvoiceDocument) -> crate::Result<Table> {
        let template = self.load_template()?;

        let mut rows = Vec::with_capacity(template.rows.len() + invoice.records.len());
        for row in &template.rows {
            if is_records_row(row) {
                for record in &invoice.records {
                    rows.push(row.iter().map(|c| substitute_record(c, record, invoice)).collect());
                }
            } else {
                rows.push(row.iter().map(|c| substitute_scalars(c, invoice)).collect());
            }
        }

        Ok(Table {
            header: template
                .header
                .iter()
                .map(|c| substitute_scalars(c, invoice))
                .collect(),
            rows,
        })
    }

    fn artifact_stem(&self, invoice: &InvoiceDocument) -> String {
        self.file_name_format
            .replace(NUMBER_PLACEHOLDER, &invoice.invoice_number)
    }
}

impl InvoiceRenderer for TemplateRenderer {
    fn validate(&self) -> crate::Result<()> {
        self.load_template().map(|_| ())
    }

    fn render(&self, invoice: &InvoiceDocument, output_dir: &Path) -> crate::Result<PathBuf> {
        let table = self.fill(invoice)?;

        std::fs::create_dir_all(output_dir).map_err(|source| RenderError::Write {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let rendered = output_dir.join(format!("{}.csv", self.artifact_stem(invoice)));
        table
            .write_atomic(&rendered)
            .map_err(|e| write_error(&rendered, e))?;
        debug!("Rendered invoice table {}", rendered.display());

        let artifact = match &self.converter {
            Some(converter) => {
                let converted = converter.convert(&rendered, output_dir)?;
                std::fs::remove_file(&rendered).map_err(|source| RenderError::Write {
                    path: rendered.clone(),
                    source,
                })?;
                converted
            }
            None => rendered,
        };

        info!(
            invoice = %invoice.invoice_number,
            artifact = %artifact.display(),
            "Invoice artifact written"
        );
        Ok(artifact)
    }
}

fn write_error(path: &Path, error: BillingError) -> BillingError {
    match error {
        BillingError::Io(source) => RenderError::Write {
            path: path.to_path_buf(),
            source,
        }
        .into(),
        other => other,
    }
}

fn is_records_row(row: &[String]) -> bool {
    row.iter().any(|c| c.contains(RECORDS_MARKER))
}

fn substitute_scalars(cell: &str, invoice: &InvoiceDocument) -> String {
    cell.replace("${invoiceNumber}", &invoice.invoice_number)
}

fn substitute_record(cell: &str, record: &BillingRecord, invoice: &InvoiceDocument) -> String {
    substitute_scalars(cell, invoice)
        .replace("${table:records.weekOfYear}", &record.week_of_year.to_string())
        .replace("${table:records.hours}", &money(record.hours))
        .replace("${table:records.price}", &record.price.normalize().to_string())
        .replace("${table:records.total}", &money(record.total))
}

fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
