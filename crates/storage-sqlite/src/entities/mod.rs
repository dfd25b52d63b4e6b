//! SQLite storage implementation for tracked entities and the market
//! view queries over them.

mod model;
mod repository;

pub use model::{EntityStatsRow, NewEntityDB, PriceRow, TrackedEntityDB};
pub use repository::EntityRepository;
