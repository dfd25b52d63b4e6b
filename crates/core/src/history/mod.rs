//! Daily history persistence.
//!
//! - [`model`] - Stored points, write outcomes and the completeness rule
//! - [`store`] - Transactional upsert keyed by (symbol, date)
//! - [`writer`] - Saves a fetched series and invalidates dependent cache views

pub mod model;
pub mod store;
pub mod writer;

pub use model::{Completeness, HistoryPoint, WriteOutcome};
pub use store::HistoryStore;
pub use writer::HistoryWriter;
