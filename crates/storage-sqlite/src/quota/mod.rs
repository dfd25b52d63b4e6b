//! SQLite storage implementation for the quota ledger.

mod model;
mod repository;

pub use model::QuotaRowDB;
pub use repository::QuotaRepository;
