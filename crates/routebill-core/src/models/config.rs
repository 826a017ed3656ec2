//! Configuration structures for the billing pipeline.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::numbering::{InvoiceNumbering, NUMBER_PLACEHOLDER};

/// Main configuration for the routebill pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Contract constants (rate, price, administrative cost).
    pub contract: ContractConfig,

    /// Invoice numbering and file naming.
    pub numbering: NumberingConfig,

    /// Report extraction configuration.
    pub extraction: ExtractionConfig,

    /// Artifact rendering configuration.
    pub render: RenderConfig,
}

/// Contract constants that drive every billing computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Number of stops that count as one billable hour.
    #[serde(alias = "stopsPerHour")]
    pub stops_per_hour: Decimal,

    /// Price paid per stop.
    #[serde(alias = "stopPrice")]
    pub stop_price: Decimal,

    /// Flat administrative cost deducted once per invoice.
    #[serde(alias = "administrationalCost")]
    pub administrational_cost: Decimal,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            stops_per_hour: Decimal::new(35, 0),
            stop_price: Decimal::new(145, 2),
            administrational_cost: Decimal::new(300, 0),
        }
    }
}

impl ContractConfig {
    /// Price of one billable hour.
    pub fn hourly_price(&self) -> Decimal {
        self.stops_per_hour * self.stop_price
    }

    /// The administrative cost expressed in billable hours.
    pub fn administrational_hours(&self) -> Decimal {
        self.administrational_cost / self.hourly_price()
    }
}

/// Invoice numbering and artifact naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    /// Invoice ref used when the ledger has none yet.
    #[serde(alias = "startInvoiceNumber")]
    pub start_invoice_number: String,

    /// Format of an invoice ref; `{number}` is replaced by the padded sequence.
    #[serde(alias = "invoiceNumberFormat")]
    pub invoice_number_format: String,

    /// Artifact file stem; `{number}` is replaced by the full invoice ref.
    #[serde(alias = "invoiceFileNameFormat")]
    pub invoice_file_name_format: String,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            start_invoice_number: "INVOICE #040".to_string(),
            invoice_number_format: "INVOICE #{number}".to_string(),
            invoice_file_name_format: "MTNA_invoice {number}".to_string(),
        }
    }
}

/// How a report date maps to a period number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekNumbering {
    /// ISO 8601 weeks (Monday start, week 1 holds the first Thursday).
    #[default]
    Iso,
    /// Sunday-start weeks, week 1 is the week containing January 1st.
    Sunday,
}

/// Report extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Week numbering scheme for `week of year`.
    pub week_numbering: WeekNumbering,

    /// Maximum number of documents extracted concurrently.
    pub jobs: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            week_numbering: WeekNumbering::Iso,
            jobs: 4,
        }
    }
}

/// Artifact rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Convert the rendered table to PDF with an office suite.
    pub convert_to_pdf: bool,

    /// Converter executable (LibreOffice `soffice`).
    pub converter_binary: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            convert_to_pdf: false,
            converter_binary: "soffice".to_string(),
        }
    }
}

impl BillingConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::from)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations that would make billing meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let contract = &self.contract;
        if contract.stops_per_hour <= Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                field: "stops_per_hour",
                requirement: "positive",
                value: contract.stops_per_hour.to_string(),
            });
        }
        if contract.stop_price <= Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                field: "stop_price",
                requirement: "positive",
                value: contract.stop_price.to_string(),
            });
        }
        if contract.administrational_cost < Decimal::ZERO {
            return Err(ConfigError::OutOfRange {
                field: "administrational_cost",
                requirement: "non-negative",
                value: contract.administrational_cost.to_string(),
            });
        }
        if self.extraction.jobs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "jobs",
                requirement: "at least 1",
                value: "0".to_string(),
            });
        }

        let file_format = &self.numbering.invoice_file_name_format;
        if file_format.matches(NUMBER_PLACEHOLDER).count() != 1 {
            return Err(ConfigError::BadFormat {
                field: "invoice_file_name_format",
                value: file_format.clone(),
            });
        }

        let numbering = InvoiceNumbering::new(&self.numbering.invoice_number_format)?;
        if !matches!(numbering.parse(&self.numbering.start_invoice_number), Ok(Some(_))) {
            return Err(ConfigError::StartMismatch {
                start: self.numbering.start_invoice_number.clone(),
                format: self.numbering.invoice_number_format.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BillingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_administrational_hours() {
        let contract = ContractConfig::default();
        assert_eq!(contract.hourly_price(), Decimal::new(5075, 2));
        let hours = contract.administrational_hours().round_dp(4);
        assert_eq!(hours, Decimal::new(59113, 4));
    }

    #[test]
    fn test_camel_case_aliases() {
        let json = r#"{
            "contract": { "stopsPerHour": 40, "stopPrice": "1.50", "administrationalCost": 0 },
            "numbering": { "startInvoiceNumber": "INV-001", "invoiceNumberFormat": "INV-{number}" }
        }"#;
        let config: BillingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.contract.stops_per_hour, Decimal::new(40, 0));
        assert_eq!(config.contract.stop_price, Decimal::new(150, 2));
        assert_eq!(config.numbering.start_invoice_number, "INV-001");
        assert_eq!(config.numbering.invoice_file_name_format, "MTNA_invoice {number}");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_rate() {
        let mut config = BillingConfig::default();
        config.contract.stops_per_hour = Decimal::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "stops_per_hour", .. })
        ));
    }

    #[test]
    fn test_rejects_format_without_placeholder() {
        let mut config = BillingConfig::default();
        config.numbering.invoice_number_format = "INVOICE".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::BadFormat { .. })));
    }

    #[test]
    fn test_rejects_mismatched_start() {
        let mut config = BillingConfig::default();
        config.numbering.start_invoice_number = "FACTUUR 12".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::StartMismatch { .. })));
    }

    #[test]
    fn test_rejects_start_number_out_of_range() {
        let mut config = BillingConfig::default();
        config.numbering.start_invoice_number = "INVOICE #99999999999999999999".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::StartMismatch { .. })));
    }
}
