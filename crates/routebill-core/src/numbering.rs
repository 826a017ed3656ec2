//! Invoice sequence numbers such as `INVOICE #041`.

use regex::Regex;

use crate::error::{ConfigError, SchemaError};

/// Placeholder for the sequence number inside format strings.
pub const NUMBER_PLACEHOLDER: &str = "{number}";

/// Minimum width of the zero-padded sequence number.
const NUMBER_WIDTH: usize = 3;

/// Parses and produces invoice refs for one numbering format.
#[derive(Debug, Clone)]
pub struct InvoiceNumbering {
    format: String,
    pattern: Regex,
}

impl InvoiceNumbering {
    /// Compile a numbering format such as `INVOICE #{number}`.
    pub fn new(format: &str) -> Result<Self, ConfigError> {
        let mut parts = format.split(NUMBER_PLACEHOLDER);
        let (Some(prefix), Some(suffix), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ConfigError::BadFormat {
                field: "invoice_number_format",
                value: format.to_string(),
            });
        };

        let pattern = Regex::new(&format!(
            r"^{}(\d+){}$",
            regex::escape(prefix),
            regex::escape(suffix)
        ))
        .map_err(|_| ConfigError::BadFormat {
            field: "invoice_number_format",
            value: format.to_string(),
        })?;

        Ok(Self {
            format: format.to_string(),
            pattern,
        })
    }

    /// Sequence number embedded in `invoice_ref`; `None` if it does not match the format.
    ///
    /// A ref that matches but whose number does not fit a `u64` is an error.
    pub fn parse(&self, invoice_ref: &str) -> Result<Option<u64>, SchemaError> {
        let Some(caps) = self.pattern.captures(invoice_ref) else {
            return Ok(None);
        };
        caps[1]
            .parse()
            .map(Some)
            .map_err(|_| SchemaError::InvoiceRef {
                value: invoice_ref.to_string(),
                reason: "sequence number out of range",
            })
    }

    /// Render a sequence number in this format.
    pub fn format(&self, number: u64) -> String {
        self.format.replace(
            NUMBER_PLACEHOLDER,
            &format!("{:0width$}", number, width = NUMBER_WIDTH),
        )
    }

    /// Ref following `last_ref`, or `start_ref` when there is no previous ref in this format.
    pub fn next_number(&self, last_ref: Option<&str>, start_ref: &str) -> Result<String, SchemaError> {
        let Some(last_ref) = last_ref else {
            return Ok(start_ref.to_string());
        };
        match self.parse(last_ref)? {
            Some(number) => {
                let next = number.checked_add(1).ok_or_else(|| SchemaError::InvoiceRef {
                    value: last_ref.to_string(),
                    reason: "sequence number exhausted",
                })?;
                Ok(self.format(next))
            }
            None => Ok(start_ref.to_string()),
        }
    }
}
