//! File-backed ledger operations.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::schema::LedgerSchema;
use crate::Result;
use crate::models::record::{LedgerRow, PeriodRecord};
use crate::table::Table;

/// Unbilled ledger rows keyed by week, ascending.
pub type UnbilledGroups = BTreeMap<u32, Vec<LedgerRow>>;

/// The persistent ledger file.
///
/// Every operation re-reads the file and binds its schema; every mutation
/// rewrites it atomically. A single process is assumed to own the ledger for
/// the duration of a run.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

/// A ledger table together with its bound schema.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub table: Table,
    pub schema: LedgerSchema,
}

impl LedgerSnapshot {
    /// Data rows with their 1-based spreadsheet row numbers (the header is row 1).
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &Vec<String>)> {
        self.table.rows.iter().enumerate().map(|(i, row)| (i + 2, row))
    }
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger and bind its schema.
    pub fn open(&self) -> Result<LedgerSnapshot> {
        let table = Table::read(&self.path)?;
        let schema = LedgerSchema::bind(&table.header, &self.path)?;
        Ok(LedgerSnapshot { table, schema })
    }

    /// Dates already present in the ledger.
    pub fn load_existing_dates(&self) -> Result<BTreeSet<NaiveDate>> {
        let snapshot = self.open()?;
        existing_dates(&snapshot)
    }

    /// The last non-empty invoice ref in row order, if any.
    pub fn load_last_invoice_ref(&self) -> Result<Option<String>> {
        let snapshot = self.open()?;
        let last = snapshot
            .table
            .rows
            .iter()
            .filter_map(|row| snapshot.schema.invoice_ref(row))
            .last()
            .map(str::to_string);

        if let Some(ref invoice_ref) = last {
            debug!(invoice_ref = %invoice_ref, "Found a previous invoice in ledger");
        }
        Ok(last)
    }

    /// Append every record whose date is not in the ledger yet, as unbilled rows.
    ///
    /// Records repeating a date within `records` are collapsed to the first one.
    /// Returns the dates actually appended; the file is not touched when there are none.
    pub fn append_new_rows(&self, records: &[PeriodRecord]) -> Result<Vec<NaiveDate>> {
        let mut snapshot = self.open()?;
        let mut seen = existing_dates(&snapshot)?;
        let width = snapshot.table.header.len();

        let mut appended = Vec::new();
        for record in records {
            if !seen.insert(record.date) {
                continue;
            }
            let row = snapshot
                .schema
                .write_row(&LedgerRow::unbilled(record.clone()), width);
            snapshot.table.rows.push(row);
            appended.push(record.date);
        }

        if appended.is_empty() {
            debug!("No new ledger rows");
            return Ok(appended);
        }

        snapshot.table.write_atomic(&self.path)?;
        info!(
            count = appended.len(),
            ledger = %self.path.display(),
            "Appended new ledger rows"
        );
        Ok(appended)
    }

    /// Rows not yet billed, grouped by week of year.
    pub fn read_unbilled(&self) -> Result<UnbilledGroups> {
        let snapshot = self.open()?;
        let mut groups = UnbilledGroups::new();

        for (row_number, row) in snapshot.numbered_rows() {
            if snapshot.schema.is_billed(row) {
                continue;
            }
            if let Some(ledger_row) = snapshot.schema.read_row(row, row_number)? {
                groups
                    .entry(ledger_row.record.week_of_year)
                    .or_default()
                    .push(ledger_row);
            }
        }

        debug!(weeks = groups.len(), "Read unbilled ledger rows");
        Ok(groups)
    }

    /// Mark every unbilled row whose date is in `dates` as billed on `invoice_ref`.
    ///
    /// Rows that are already billed are left untouched. Returns the number of rows marked.
    pub fn mark_billed(&self, dates: &BTreeSet<NaiveDate>, invoice_ref: &str) -> Result<usize> {
        let mut snapshot = self.open()?;
        let LedgerSnapshot { table, schema } = &mut snapshot;

        let mut marked = 0;
        for (index, row) in table.rows.iter_mut().enumerate() {
            if schema.is_billed(row) {
                continue;
            }
            let Some(date) = schema.date(row, index + 2)? else {
                continue;
            };
            if dates.contains(&date) {
                schema.set_billed(row, invoice_ref);
                marked += 1;
            }
        }

        if marked > 0 {
            snapshot.table.write_atomic(&self.path)?;
        }
        info!(marked, invoice_ref, "Marked ledger rows as billed");
        Ok(marked)
    }
}

fn existing_dates(snapshot: &LedgerSnapshot) -> Result<BTreeSet<NaiveDate>> {
    let mut dates = BTreeSet::new();
    for (row_number, row) in snapshot.numbered_rows() {
        if let Some(date) = snapshot.schema.date(row, row_number)? {
            dates.insert(date);
        }
    }
    Ok(dates)
}
