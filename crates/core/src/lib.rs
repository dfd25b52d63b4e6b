//! StockPulse Core - quota-governed history sync and live market fan-out.
//!
//! This crate holds the domain logic. It is database-agnostic and defines
//! the store traits that the `storage-sqlite` crate implements.

pub mod cache;
pub mod calls;
pub mod clock;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod fanout;
pub mod history;
pub mod market;
pub mod priority;
pub mod quota;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
