//! SQLite storage implementation for the provider call log.

mod model;
mod repository;

pub use model::{CallRecordDB, CallStatsRow};
pub use repository::CallLogRepository;
