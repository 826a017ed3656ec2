//! Billing data models: extracted reports, ledger rows and invoice lines.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One activity report, as extracted from a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// Report date; the natural key of the ledger.
    pub date: NaiveDate,

    /// Total successful stops on that date.
    pub total_stops: u32,

    /// Week number (1-53) derived from `date`.
    pub week_of_year: u32,

    /// `total_stops / stops_per_hour`, rounded to 2 decimals.
    pub converted_hours: Decimal,
}

/// A persisted ledger row: a period record plus its billing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(flatten)]
    pub record: PeriodRecord,

    /// Invoice the row was billed on, once billed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_ref: Option<String>,

    /// Whether the row has been included in a rendered invoice.
    pub billed: bool,
}

impl LedgerRow {
    /// A fresh, unbilled row.
    pub fn unbilled(record: PeriodRecord) -> Self {
        Self {
            record,
            invoice_ref: None,
            billed: false,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.record.date
    }
}

/// One invoice line: a billed week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRecord {
    /// Week number.
    pub week_of_year: u32,

    /// Billable hours, after the administrative deduction where applied.
    pub hours: Decimal,

    /// Hourly rate column (stops per hour).
    pub price: Decimal,

    /// `hours * stops_per_hour * stop_price`.
    pub total: Decimal,
}

/// Everything a renderer needs to produce one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub records: Vec<BillingRecord>,
}
