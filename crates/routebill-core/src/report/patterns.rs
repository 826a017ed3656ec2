//! Regex patterns for activity report extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Report date: "Activiteitenrapport 05-02-2024"
    pub static ref REPORT_DATE: Regex = Regex::new(
        r"Activiteitenrapport\s*([0-9]{2}-[0-9]{2}-[0-9]{4})"
    ).unwrap();

    // Stop count: "Totaal aantal succesvolle stops 142"
    pub static ref SUCCESSFUL_STOPS: Regex = Regex::new(
        r"Totaal aantal succesvolle stops\s*([0-9]+)"
    ).unwrap();
}

/// Date format used in reports and in the ledger.
pub const REPORT_DATE_FORMAT: &str = "%d-%m-%Y";
