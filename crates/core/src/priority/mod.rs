//! Priority selector.
//!
//! A pure projection over entity stats. Ordering:
//!
//! 1. cold entities (zero history points) first
//! 2. larger importance metric first, unknown metric last
//! 3. symbol ascending
//!
//! Identical input always yields identical output, so a restarted process
//! resumes with the same order.

mod selector;

pub use selector::{
    pending_entities, periodic_target, rank_entities, EntityPriority, PrioritySelector,
};
