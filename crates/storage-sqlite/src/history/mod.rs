//! SQLite storage implementation for daily history.

mod model;
mod repository;

pub use model::HistoryPointDB;
pub use repository::HistoryRepository;
