//! Extraction of the report date and stop count from report text.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use super::Result;
use super::dates::week_of_year;
use super::patterns::{REPORT_DATE, REPORT_DATE_FORMAT, SUCCESSFUL_STOPS};
use crate::error::ExtractionError;
use crate::models::config::{BillingConfig, WeekNumbering};
use crate::models::record::PeriodRecord;

/// Turns the plain text of an activity report into a [`PeriodRecord`].
#[derive(Debug, Clone)]
pub struct ReportExtractor {
    stops_per_hour: Decimal,
    week_numbering: WeekNumbering,
}

impl ReportExtractor {
    /// Create an extractor for a given stops-per-hour rate.
    pub fn new(stops_per_hour: Decimal) -> Self {
        Self {
            stops_per_hour,
            week_numbering: WeekNumbering::default(),
        }
    }

    /// Create an extractor from the pipeline configuration.
    pub fn from_config(config: &BillingConfig) -> Self {
        Self::new(config.contract.stops_per_hour)
            .with_week_numbering(config.extraction.week_numbering)
    }

    /// Set the week numbering scheme.
    pub fn with_week_numbering(mut self, numbering: WeekNumbering) -> Self {
        self.week_numbering = numbering;
        self
    }

    /// Extract one record. Both facts are required; a report missing either is rejected.
    ///
    /// `document` only labels errors and logs.
    pub fn extract(&self, document: &str, text: &str) -> Result<PeriodRecord> {
        let date_text = REPORT_DATE
            .captures(text)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ExtractionError::MissingDate {
                document: document.to_string(),
            })?;

        let stops_text = SUCCESSFUL_STOPS
            .captures(text)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ExtractionError::MissingStops {
                document: document.to_string(),
            })?;

        let date = NaiveDate::parse_from_str(&date_text, REPORT_DATE_FORMAT).map_err(|_| {
            ExtractionError::InvalidDate {
                document: document.to_string(),
                value: date_text.clone(),
            }
        })?;

        let total_stops: u32 = stops_text.parse().map_err(|_| ExtractionError::InvalidStops {
            document: document.to_string(),
            value: stops_text.clone(),
        })?;

        let record = PeriodRecord {
            date,
            total_stops,
            week_of_year: week_of_year(date, self.week_numbering),
            converted_hours: self.converted_hours(total_stops),
        };

        debug!(
            document,
            date = %record.date,
            stops = record.total_stops,
            week = record.week_of_year,
            "Extracted activity report"
        );

        Ok(record)
    }

    /// Stops expressed in hours, rounded half away from zero to 2 decimals.
    pub fn converted_hours(&self, total_stops: u32) -> Decimal {
        (Decimal::from(total_stops) / self.stops_per_hour)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
