//! Quota ledger for the external provider.
//!
//! - [`model`] - Persisted counters and the pure rollover/permit rules
//! - [`store`] - Storage trait with compare-and-swap updates
//! - [`ledger`] - The gate every provider call goes through

pub mod ledger;
pub mod model;
pub mod store;


pub use ledger::{QuotaConfig, QuotaLedger};
pub use model::{QuotaState, QuotaStatus};
pub use store::QuotaStore;
