//! Run command - bill every new activity report in a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use routebill_core::{
    LedgerStore, PdfDocumentSource, Pipeline, RunOutcome, TemplateRenderer, discover_documents,
};

use super::config::load_config;

/// Arguments for an invoicing run.
#[derive(Args)]
pub struct RunArgs {
    /// Ledger file (CSV with date, total stops, week of year, converted hours, invoice.nr, invoiced)
    #[arg(required = true)]
    ledger: Option<PathBuf>,

    /// Invoice template (CSV with ${invoiceNumber} and ${table:records.*} placeholders)
    #[arg(required = true)]
    template: Option<PathBuf>,

    /// Directory for the rendered invoice
    #[arg(required = true)]
    output_dir: Option<PathBuf>,

    /// Directory searched recursively for activity report PDFs
    #[arg(required = true)]
    pdf_dir: Option<PathBuf>,
}

pub async fn run(args: RunArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let (Some(ledger), Some(template), Some(output_dir), Some(pdf_dir)) =
        (args.ledger, args.template, args.output_dir, args.pdf_dir)
    else {
        anyhow::bail!("Usage: routebill <LEDGER> <TEMPLATE> <OUTPUT_DIR> <PDF_DIR>");
    };

    let ledger = std::path::absolute(ledger)?;
    let template = std::path::absolute(template)?;
    let output_dir = std::path::absolute(output_dir)?;
    let pdf_dir = std::path::absolute(pdf_dir)?;

    println!("Using ledger:     {}", ledger.display());
    println!("Using template:   {}", template.display());
    println!("Using output dir: {}", output_dir.display());
    println!("Using PDF dir:    {}", pdf_dir.display());

    let config = load_config(config_path)?;

    let documents = discover_documents(&pdf_dir)
        .with_context(|| format!("Failed to list reports in {}", pdf_dir.display()))?;
    println!(
        "{} Found {} activity reports",
        style("ℹ").blue(),
        documents.len()
    );
    for path in &documents {
        debug!("Report: {}", path.display());
    }

    let renderer = TemplateRenderer::from_config(&template, &config);
    let pipeline = Pipeline::new(
        config,
        LedgerStore::new(&ledger),
        Arc::new(PdfDocumentSource),
        Box::new(renderer),
        &output_dir,
    )?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Processing reports...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = pipeline.run(&documents).await;
    spinner.finish_and_clear();

    let outcome = outcome.with_context(|| format!("Invoicing run on {} failed", ledger.display()))?;

    match outcome {
        RunOutcome::Invoiced(run) => {
            println!(
                "{} {} written to {}",
                style("✓").green(),
                style(&run.invoice_ref).bold(),
                run.artifact.display()
            );
            println!(
                "   {} new ledger rows, {} rows billed",
                run.appended,
                run.billed_dates.len()
            );
            println!();
            println!("   {:>4}  {:>8}  {:>6}  {:>10}", "Week", "Hours", "Price", "Total");
            for record in &run.records {
                println!(
                    "   {:>4}  {:>8.2}  {:>6}  {:>10.2}",
                    record.week_of_year, record.hours, record.price, record.total
                );
            }
        }
        RunOutcome::NothingToBill => {
            println!(
                "{} No new entries to process. No invoice generated.",
                style("ℹ").blue()
            );
        }
    }

    println!();
    println!("{} Completed in {:?}", style("✓").green(), start.elapsed());

    Ok(())
}
