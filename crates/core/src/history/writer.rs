use log::{debug, info};
use std::sync::Arc;
use stockpulse_market_data::DailySeries;

use super::model::WriteOutcome;
use super::store::HistoryStore;
use crate::cache::CacheInvalidator;
use crate::clock::Clock;
use crate::entities::TrackedEntity;
use crate::errors::{Error, Result};

/// Persists fetched series.
///
/// Cache invalidation happens before `save` returns, so a reader that sees
/// the success never gets a cached view older than the write.
pub struct HistoryWriter {
    store: Arc<dyn HistoryStore>,
    invalidator: Arc<CacheInvalidator>,
    clock: Arc<dyn Clock>,
    min_points: i64,
}

impl HistoryWriter {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        invalidator: Arc<CacheInvalidator>,
        clock: Arc<dyn Clock>,
        min_points: i64,
    ) -> Self {
        Self {
            store,
            invalidator,
            clock,
            min_points,
        }
    }

    /// Writes `series` and invalidates the entity's cached views.
    pub async fn save(&self, entity: &TrackedEntity, series: &DailySeries) -> Result<WriteOutcome> {
        let outcome = self.write(entity, series).await?;
        self.invalidate(entity).await;
        Ok(outcome)
    }

    /// The transactional upsert alone. Callers must follow a successful
    /// write with [`invalidate`](Self::invalidate) before reporting success.
    pub async fn write(&self, entity: &TrackedEntity, series: &DailySeries) -> Result<WriteOutcome> {
        if series.symbol != entity.symbol {
            return Err(Error::Validation(format!(
                "series for {} cannot be saved under {}",
                series.symbol, entity.symbol
            )));
        }
        if series.is_empty() {
            return Err(Error::Validation(format!(
                "empty series for {}",
                entity.symbol
            )));
        }

        let outcome = self
            .store
            .save_series(&entity.symbol, &series.bars, self.min_points, self.clock.now())
            .await?;

        info!(
            "Saved history for {}: {} inserted, {} updated, {} total{}",
            entity.symbol,
            outcome.inserted,
            outcome.updated,
            outcome.history_count,
            if outcome.has_sufficient_data {
                ""
            } else {
                " (incomplete)"
            }
        );
        Ok(outcome)
    }

    pub async fn invalidate(&self, entity: &TrackedEntity) {
        let removed = self
            .invalidator
            .invalidate_entity(&entity.symbol, entity.sector.as_deref())
            .await;
        debug!("Invalidated {} cache keys for {}", removed, entity.symbol);
    }
}
