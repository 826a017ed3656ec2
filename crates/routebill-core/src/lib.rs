//! Core library for stop-report invoicing.
//!
//! This crate provides:
//! - Activity report extraction from PDF text (report date, successful stops)
//! - A CSV-backed ledger with date-keyed deduplication and billing state
//! - Invoice numbering, per-week billing aggregation and template rendering
//! - The pipeline that ties these together without double billing

pub mod billing;
pub mod error;
pub mod ledger;
pub mod models;
pub mod numbering;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod table;

pub use billing::BillingAggregator;
pub use error::{BillingError, Result};
pub use ledger::{LedgerStore, UnbilledGroups};
pub use models::config::BillingConfig;
pub use models::record::{BillingRecord, InvoiceDocument, LedgerRow, PeriodRecord};
pub use numbering::InvoiceNumbering;
pub use pdf::{DocumentSource, PdfDocumentSource, PdfExtractor, PdfProcessor, discover_documents};
pub use pipeline::{InvoiceRun, Pipeline, RunOutcome, RunState};
pub use render::{InvoiceRenderer, TemplateRenderer};
pub use report::ReportExtractor;
