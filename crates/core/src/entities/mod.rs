//! Tracked entities (equity symbols) and their seed list.

pub mod model;
pub mod seeds;
pub mod store;

pub use model::{EntityStats, NewEntity, TrackedEntity};
pub use seeds::default_seeds;
pub use store::EntityStore;
