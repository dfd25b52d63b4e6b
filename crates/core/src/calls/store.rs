use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{CallRecord, CallStats};
use crate::errors::Result;

/// Append-only log of provider calls.
#[async_trait]
pub trait CallLogStore: Send + Sync {
    async fn append(&self, record: &CallRecord) -> Result<()>;

    /// Deletes records created before `cutoff`. Returns the number removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Most recent records first.
    fn recent(&self, limit: i64) -> Result<Vec<CallRecord>>;

    /// Per-day, per-endpoint aggregates for records created at or after `since`.
    fn daily_stats(&self, since: DateTime<Utc>) -> Result<Vec<CallStats>>;
}
