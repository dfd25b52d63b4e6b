//! Provider call metering and the audit log.
//!
//! - [`model`] - The append-only [`CallRecord`] and per-day statistics
//! - [`store`] - Call log persistence with an age-based sweep
//! - [`client`] - The metered client: quota gate, one physical call, one record

pub mod client;
pub mod model;
pub mod store;

#[cfg(test)]
mod client_tests;

pub use client::{sweep_call_log, ProviderClient};
pub use model::{CallRecord, CallStats};
pub use store::CallLogStore;
