//! Binding of logical ledger fields to physical column positions.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::SchemaError;
use crate::models::record::{LedgerRow, PeriodRecord};
use crate::report::patterns::REPORT_DATE_FORMAT;
use crate::table::{cell, set_cell};

pub const COL_DATE: &str = "date";
pub const COL_TOTAL_STOPS: &str = "total stops";
pub const COL_WEEK_OF_YEAR: &str = "week of year";
pub const COL_CONVERTED_HOURS: &str = "converted hours";
pub const COL_INVOICE_REF: &str = "invoice.nr";
pub const COL_INVOICED: &str = "invoiced";

/// Column positions of every logical ledger field, resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSchema {
    path: PathBuf,
    date: usize,
    total_stops: usize,
    week_of_year: usize,
    converted_hours: usize,
    invoice_ref: usize,
    invoiced: usize,
}

impl LedgerSchema {
    /// Resolve all required columns. Header names are matched trimmed and case-insensitively.
    pub fn bind(header: &[String], path: &Path) -> Result<Self, SchemaError> {
        if header.is_empty() {
            return Err(SchemaError::NoHeader {
                path: path.to_path_buf(),
            });
        }

        let find = |column: &'static str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(column))
                .ok_or_else(|| SchemaError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };

        Ok(Self {
            path: path.to_path_buf(),
            date: find(COL_DATE)?,
            total_stops: find(COL_TOTAL_STOPS)?,
            week_of_year: find(COL_WEEK_OF_YEAR)?,
            converted_hours: find(COL_CONVERTED_HOURS)?,
            invoice_ref: find(COL_INVOICE_REF)?,
            invoiced: find(COL_INVOICED)?,
        })
    }

    /// Report date of a row; `None` for rows with an empty date cell.
    ///
    /// `row_number` is 1-based and counts the header, matching what a spreadsheet shows.
    pub fn date(&self, row: &[String], row_number: usize) -> Result<Option<NaiveDate>, SchemaError> {
        let value = cell(row, self.date).trim();
        if value.is_empty() {
            return Ok(None);
        }
        parse_date(value)
            .map(Some)
            .ok_or_else(|| self.invalid(row_number, COL_DATE, value))
    }

    /// Invoice ref of a row, if filled in.
    pub fn invoice_ref<'a>(&self, row: &'a [String]) -> Option<&'a str> {
        let value = cell(row, self.invoice_ref).trim();
        (!value.is_empty()).then_some(value)
    }

    /// Whether a row is marked as invoiced.
    pub fn is_billed(&self, row: &[String]) -> bool {
        matches!(
            cell(row, self.invoiced).trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1" | "x"
        )
    }

    /// Fully typed view of a row; `None` for rows with an empty date cell.
    pub fn read_row(&self, row: &[String], row_number: usize) -> Result<Option<LedgerRow>, SchemaError> {
        let Some(date) = self.date(row, row_number)? else {
            return Ok(None);
        };

        let record = PeriodRecord {
            date,
            total_stops: self.parse_cell(row, row_number, self.total_stops, COL_TOTAL_STOPS)?,
            week_of_year: self.parse_cell(row, row_number, self.week_of_year, COL_WEEK_OF_YEAR)?,
            converted_hours: self.parse_cell(
                row,
                row_number,
                self.converted_hours,
                COL_CONVERTED_HOURS,
            )?,
        };

        Ok(Some(LedgerRow {
            record,
            invoice_ref: self.invoice_ref(row).map(str::to_string),
            billed: self.is_billed(row),
        }))
    }

    /// Physical cells for a new row, `width` wide; unknown columns stay empty.
    pub fn write_row(&self, ledger_row: &LedgerRow, width: usize) -> Vec<String> {
        let record = &ledger_row.record;
        let mut row = vec![String::new(); width];
        set_cell(&mut row, self.date, record.date.format(REPORT_DATE_FORMAT).to_string());
        set_cell(&mut row, self.total_stops, record.total_stops.to_string());
        set_cell(&mut row, self.week_of_year, record.week_of_year.to_string());
        set_cell(&mut row, self.converted_hours, record.converted_hours.to_string());
        set_cell(
            &mut row,
            self.invoice_ref,
            ledger_row.invoice_ref.clone().unwrap_or_default(),
        );
        set_cell(&mut row, self.invoiced, if ledger_row.billed { "true" } else { "" });
        row
    }

    /// Mark a row billed on `invoice_ref`.
    pub fn set_billed(&self, row: &mut Vec<String>, invoice_ref: &str) {
        set_cell(row, self.invoice_ref, invoice_ref);
        set_cell(row, self.invoiced, "true");
    }

    fn parse_cell<T: FromStr>(
        &self,
        row: &[String],
        row_number: usize,
        index: usize,
        column: &'static str,
    ) -> Result<T, SchemaError> {
        let value = cell(row, index).trim();
        value
            .parse()
            .map_err(|_| self.invalid(row_number, column, value))
    }

    fn invalid(&self, row_number: usize, column: &'static str, value: &str) -> SchemaError {
        SchemaError::InvalidCell {
            path: self.path.clone(),
            row: row_number,
            column,
            value: value.to_string(),
        }
    }
}

/// Ledger dates are written as `dd-mm-yyyy`; ISO dates are accepted on read.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, REPORT_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}
