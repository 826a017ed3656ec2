//! The billing ledger: one row per report date, with billing state.

pub mod schema;
mod store;

pub use schema::LedgerSchema;
pub use store::{LedgerSnapshot, LedgerStore, UnbilledGroups};
