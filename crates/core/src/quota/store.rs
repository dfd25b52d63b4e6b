//! Quota storage trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::QuotaState;
use crate::errors::Result;

/// Persistence for quota rows, one per external service.
///
/// Writers never overwrite blindly. Every mutation goes through
/// [`compare_and_swap`](QuotaStore::compare_and_swap) so that two callers
/// reading the same counters cannot both commit an increment. Callers pass
/// `now`, which stamps the row's update time.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Loads the row for `service`.
    async fn load(&self, service: &str) -> Result<Option<QuotaState>>;

    /// Inserts `initial` when no row exists, then applies its limits to the
    /// stored row. Returns the stored row.
    async fn ensure(&self, initial: &QuotaState, now: DateTime<Utc>) -> Result<QuotaState>;

    /// Replaces the row with `next` only if the stored counters and reset
    /// markers still equal `expected`. Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        expected: &QuotaState,
        next: &QuotaState,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}
