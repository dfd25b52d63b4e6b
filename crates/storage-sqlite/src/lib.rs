//! SQLite storage implementation for StockPulse.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the store traits defined in `stockpulse-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for quota, call log, entities and history
//! - Database-specific model types (with Diesel derives)
//!
//! ```text
//!      core (domain, traits)
//!               │
//!               ▼
//!   storage-sqlite (this crate)
//!               │
//!               ▼
//!           SQLite DB
//! ```
//!
//! Reads use pooled connections. Every write goes through the single
//! [`WriteHandle`] actor so that SQLite never sees two writers at once.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod calls;
pub mod entities;
pub mod history;
pub mod quota;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use calls::CallLogRepository;
pub use entities::EntityRepository;
pub use history::HistoryRepository;
pub use quota::QuotaRepository;

// Re-export from stockpulse-core for convenience
pub use stockpulse_core::errors::{DatabaseError, Error, Result};
