//! The invoicing run: extract, merge, aggregate, render, mark billed.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error, info};

use crate::Result;
use crate::billing::BillingAggregator;
use crate::ledger::LedgerStore;
use crate::models::config::BillingConfig;
use crate::models::record::{BillingRecord, InvoiceDocument, PeriodRecord};
use crate::numbering::InvoiceNumbering;
use crate::pdf::DocumentSource;
use crate::render::InvoiceRenderer;
use crate::report::ReportExtractor;

/// Progress of a run. A failure in any state aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    Extracted,
    Merged,
    Aggregated,
    Rendered,
    Marked,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// An invoice was rendered and its rows marked billed.
    Invoiced(InvoiceRun),
    /// The ledger had no unbilled rows; no invoice number was used.
    NothingToBill,
}

/// Details of a rendered invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRun {
    pub invoice_ref: String,
    pub artifact: PathBuf,
    pub records: Vec<BillingRecord>,
    pub billed_dates: BTreeSet<NaiveDate>,
    /// Rows added to the ledger by this run.
    pub appended: usize,
}

/// One invoicing pipeline over a ledger, a document source and a renderer.
pub struct Pipeline {
    config: BillingConfig,
    extractor: ReportExtractor,
    numbering: InvoiceNumbering,
    aggregator: BillingAggregator,
    ledger: LedgerStore,
    source: Arc<dyn DocumentSource>,
    renderer: Box<dyn InvoiceRenderer>,
    output_dir: PathBuf,
}

impl Pipeline {
    /// Build a pipeline. The configuration is validated here.
    pub fn new(
        config: BillingConfig,
        ledger: LedgerStore,
        source: Arc<dyn DocumentSource>,
        renderer: Box<dyn InvoiceRenderer>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        let numbering = InvoiceNumbering::new(&config.numbering.invoice_number_format)?;

        Ok(Self {
            extractor: ReportExtractor::from_config(&config),
            aggregator: BillingAggregator::new(config.contract.clone()),
            numbering,
            config,
            ledger,
            source,
            renderer,
            output_dir: output_dir.into(),
        })
    }

    /// Extract every document concurrently. Any failure fails the whole batch.
    ///
    /// Records come back in document order.
    pub async fn extract_all(&self, documents: &[PathBuf]) -> Result<Vec<PeriodRecord>> {
        let jobs = self.config.extraction.jobs.max(1);

        stream::iter(documents.iter().cloned())
            .map(|path| {
                let source = Arc::clone(&self.source);
                let extractor = self.extractor.clone();
                tokio::task::spawn_blocking(move || extract_document(source.as_ref(), &extractor, &path))
            })
            .buffered(jobs)
            .map(|joined| joined.unwrap_or_else(|e| Err(std::io::Error::other(e).into())))
            .try_collect()
            .await
    }

    /// Run the whole pipeline over `documents`.
    pub async fn run(&self, documents: &[PathBuf]) -> Result<RunOutcome> {
        let mut state = RunState::Start;
        let outcome = self.run_from(&mut state, documents).await;
        if let Err(ref e) = outcome {
            error!(%state, error = %e, "Invoicing run failed");
        }
        outcome
    }

    async fn run_from(&self, state: &mut RunState, documents: &[PathBuf]) -> Result<RunOutcome> {
        self.renderer.validate()?;

        let records = self.extract_all(documents).await?;
        advance(state, RunState::Extracted);

        let last_ref = self.ledger.load_last_invoice_ref()?;
        let invoice_ref = self
            .numbering
            .next_number(last_ref.as_deref(), &self.config.numbering.start_invoice_number)?;
        let appended = self.ledger.append_new_rows(&records)?;
        debug!(invoice_ref = %invoice_ref, appended = appended.len(), "Candidate invoice number");
        advance(state, RunState::Merged);

        let groups = self.ledger.read_unbilled()?;
        if groups.is_empty() {
            info!("No new entries to process. No invoice generated.");
            advance(state, RunState::Done);
            return Ok(RunOutcome::NothingToBill);
        }
        let billed_dates: BTreeSet<NaiveDate> = groups
            .values()
            .flatten()
            .map(|row| row.date())
            .collect();
        let invoice = InvoiceDocument {
            invoice_number: invoice_ref.clone(),
            records: self.aggregator.aggregate(&groups),
        };
        advance(state, RunState::Aggregated);

        let artifact = self.renderer.render(&invoice, &self.output_dir)?;
        advance(state, RunState::Rendered);

        self.ledger.mark_billed(&billed_dates, &invoice_ref)?;
        advance(state, RunState::Marked);

        advance(state, RunState::Done);
        Ok(RunOutcome::Invoiced(InvoiceRun {
            invoice_ref,
            artifact,
            records: invoice.records,
            billed_dates,
            appended: appended.len(),
        }))
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug!(from = %state, to = %next, "Run state");
    *state = next;
}

fn extract_document(
    source: &dyn DocumentSource,
    extractor: &ReportExtractor,
    path: &Path,
) -> Result<PeriodRecord> {
    let text = source.read_text(path)?;
    Ok(extractor.extract(&path.display().to_string(), &text)?)
}
