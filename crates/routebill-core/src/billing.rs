//! Per-week invoice lines from unbilled ledger rows.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::ledger::UnbilledGroups;
use crate::models::config::ContractConfig;
use crate::models::record::BillingRecord;

/// Computes invoice lines under one contract.
#[derive(Debug, Clone)]
pub struct BillingAggregator {
    contract: ContractConfig,
}

impl BillingAggregator {
    pub fn new(contract: ContractConfig) -> Self {
        Self { contract }
    }

    /// One billing record per week, in ascending week order.
    ///
    /// The administrative cost, converted to hours, is deducted from the first
    /// week only. Hours are not clamped, so a small first week can bill negative.
    pub fn aggregate(&self, groups: &UnbilledGroups) -> Vec<BillingRecord> {
        let stops_per_hour = self.contract.stops_per_hour;
        let hourly_price = self.contract.hourly_price();
        let admin_hours = self.contract.administrational_hours();

        groups
            .iter()
            .enumerate()
            .map(|(index, (&week, rows))| {
                let total_stops: u64 = rows.iter().map(|r| u64::from(r.record.total_stops)).sum();
                let total_hours = Decimal::from(total_stops) / stops_per_hour;
                let billable = if index == 0 {
                    total_hours - admin_hours
                } else {
                    total_hours
                };
                let hours = round_hours(billable);

                if hours < Decimal::ZERO {
                    warn!(week, %hours, "Administrative deduction exceeds the week's hours");
                }
                debug!(week, total_stops, %hours, "Aggregated week");

                BillingRecord {
                    week_of_year: week,
                    hours,
                    price: stops_per_hour,
                    total: hours * hourly_price,
                }
            })
            .collect()
    }
}

/// Round to cents of an hour; a result of `-0.00` becomes `0.00`.
fn round_hours(hours: Decimal) -> Decimal {
    let mut rounded = hours.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}
