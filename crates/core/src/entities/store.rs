//! Entity storage trait.

use async_trait::async_trait;

use super::model::{EntityStats, NewEntity, TrackedEntity};
use crate::errors::Result;

/// Storage interface for tracked entities.
///
/// Reads are synchronous, matching the other stores: they are short pooled
/// queries. Mutations go through the single writer and are async.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Inserts entities that do not exist yet. Existing rows are left
    /// untouched. Returns the number inserted.
    async fn seed(&self, entities: &[NewEntity]) -> Result<usize>;

    /// Soft-deactivates an entity. Returns false when it does not exist.
    async fn deactivate(&self, symbol: &str) -> Result<bool>;

    fn get(&self, symbol: &str) -> Result<Option<TrackedEntity>>;

    fn list_active(&self) -> Result<Vec<TrackedEntity>>;

    /// Active entities with their history count and latest stored date.
    fn list_active_stats(&self) -> Result<Vec<EntityStats>>;
}
