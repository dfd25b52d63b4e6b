//! Sync orchestrators.
//!
//! Two entry points share one per-entity state machine ([`SyncPhase`]):
//!
//! - periodic: exactly one entity per timer tick
//! - batch: up to `min(requested, remaining quota)` entities, paced, and
//!   continuing past per-entity failures
//!
//! Both consult the quota ledger before every single fetch. Concurrent
//! periodic and batch runs are allowed; the ledger alone keeps them from
//! jointly overspending.

pub mod model;
pub mod service;


pub use model::{
    BatchResult, CoverageStatus, EntitySyncDetail, SchedulerStatus, SyncConfig, SyncErrorEntry,
    SyncErrorKind, SyncPhase, SyncReport,
};
pub use service::SyncService;
