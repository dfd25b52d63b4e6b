use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockpulse_market_data::DailyBar;

use super::model::{HistoryPoint, WriteOutcome};
use crate::errors::Result;

/// Storage interface for daily history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Upserts `bars` for `symbol` keyed by (symbol, date) in one transaction.
    ///
    /// On conflict every price and volume field is overwritten and
    /// `updated_at` is bumped. In the same transaction the entity's
    /// completeness (see [`Completeness`](super::Completeness)), history
    /// count and `last_data_sync = synced_at` are recomputed and stored.
    /// Either everything commits or nothing does.
    async fn save_series(
        &self,
        symbol: &str,
        bars: &[DailyBar],
        min_points: i64,
        synced_at: DateTime<Utc>,
    ) -> Result<WriteOutcome>;

    fn count(&self, symbol: &str) -> Result<i64>;

    /// Most recent points first.
    fn recent(&self, symbol: &str, limit: i64) -> Result<Vec<HistoryPoint>>;
}
