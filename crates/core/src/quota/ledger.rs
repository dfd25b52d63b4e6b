//! The quota gate.
//!
//! Every provider call goes through [`QuotaLedger::acquire`], which reads the
//! row, applies rollover, checks the limits and commits the increment with a
//! single compare-and-swap. A caller that loses the swap re-reads and
//! re-checks, so two contenders for the last unit cannot both proceed.

use log::{debug, info, warn};
use std::sync::{Arc, RwLock};

use super::model::{QuotaState, QuotaStatus};
use super::store::QuotaStore;
use crate::clock::Clock;
use crate::constants::{ALPHA_VANTAGE_SERVICE, DEFAULT_DAILY_LIMIT};
use crate::errors::{Error, QuotaError, Result};

/// Swap attempts before giving up under contention.
const MAX_SWAP_ATTEMPTS: usize = 16;

#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub service: String,
    pub daily_limit: i32,
    pub hourly_limit: Option<i32>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            service: ALPHA_VANTAGE_SERVICE.to_string(),
            daily_limit: DEFAULT_DAILY_LIMIT,
            hourly_limit: None,
        }
    }
}

pub struct QuotaLedger {
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
    config: QuotaConfig,
    last_known: RwLock<Option<QuotaState>>,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn QuotaStore>, clock: Arc<dyn Clock>, config: QuotaConfig) -> Self {
        Self {
            store,
            clock,
            config,
            last_known: RwLock::new(None),
        }
    }

    pub fn service(&self) -> &str {
        &self.config.service
    }

    /// Creates the ledger row if missing and applies the configured limits.
    pub async fn initialize(&self) -> Result<QuotaState> {
        let now = self.clock.now();
        let initial = QuotaState::new(
            self.config.service.clone(),
            self.config.daily_limit,
            self.config.hourly_limit,
            now,
        );
        let state = self.store.ensure(&initial, now).await?;
        info!(
            "Quota ledger for {} ready: {}/{} used today",
            state.service, state.daily_used, state.daily_limit
        );
        self.remember(&state);
        Ok(state)
    }

    /// Whether a call would be allowed right now. Storage errors deny.
    pub async fn can_proceed(&self) -> bool {
        self.check().await.is_ok()
    }

    /// Like [`can_proceed`](Self::can_proceed) but says why not. Consumes
    /// nothing; only [`acquire`](Self::acquire) commits usage.
    pub async fn check(&self) -> Result<QuotaState> {
        let state = self.read_current().await.map_err(|e| {
            warn!("Quota ledger read failed, denying: {}", e);
            Self::unavailable(e)
        })?;
        state.permits()?;
        Ok(state)
    }

    /// Atomically checks and consumes one unit of quota.
    ///
    /// Returns the committed state. Every error is a [`QuotaError`] so callers
    /// can tell a denial apart from provider or storage failures of the call
    /// itself.
    pub async fn acquire(&self) -> Result<QuotaState> {
        for attempt in 0..MAX_SWAP_ATTEMPTS {
            let current = self.read_current().await.map_err(Self::unavailable)?;
            current.permits()?;

            let next = current.consumed();
            let swapped = self
                .store
                .compare_and_swap(&current, &next, self.clock.now())
                .await
                .map_err(Self::unavailable)?;

            if swapped {
                if next.is_over_committed() {
                    warn!(
                        "Quota for {} over-committed: {}/{} used",
                        next.service, next.daily_used, next.daily_limit
                    );
                }
                debug!(
                    "Quota acquired for {}: {}/{}",
                    next.service, next.daily_used, next.daily_limit
                );
                self.remember(&next);
                return Ok(next);
            }

            debug!(
                "Quota swap for {} lost a race (attempt {})",
                self.config.service,
                attempt + 1
            );
        }

        Err(QuotaError::Unavailable(format!(
            "gave up after {} contended updates",
            MAX_SWAP_ATTEMPTS
        ))
        .into())
    }

    /// Current usage. Falls back to the last successful read, marked stale,
    /// when the store cannot be reached.
    pub async fn current(&self) -> Result<QuotaStatus> {
        match self.read_current().await {
            Ok(state) => Ok(QuotaStatus::from_state(&state, true)),
            Err(e) => match self.last_known() {
                Some(state) => {
                    warn!("Quota read failed, serving last known state: {}", e);
                    Ok(QuotaStatus::from_state(&state, false))
                }
                None => Err(e),
            },
        }
    }

    /// Applies rollover without consuming anything. Driven by the reset job.
    pub async fn refresh(&self) -> Result<QuotaState> {
        self.read_current().await
    }

    /// The last state this ledger observed, without touching storage.
    pub fn last_known(&self) -> Option<QuotaState> {
        self.last_known
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Loads the row and persists any pending rollover.
    async fn read_current(&self) -> Result<QuotaState> {
        for _ in 0..MAX_SWAP_ATTEMPTS {
            let stored = match self.store.load(&self.config.service).await? {
                Some(state) => state,
                None => self.initialize().await?,
            };

            if stored.is_over_committed() {
                warn!(
                    "Quota for {} is over its limit: {}/{}",
                    stored.service, stored.daily_used, stored.daily_limit
                );
            }

            let now = self.clock.now();
            let Some(reset) = stored.rolled_over(now) else {
                self.remember(&stored);
                return Ok(stored);
            };

            if self.store.compare_and_swap(&stored, &reset, now).await? {
                info!(
                    "Quota for {} reset (date {}, hour {})",
                    reset.service, reset.last_reset_date, reset.last_reset_hour
                );
                self.remember(&reset);
                return Ok(reset);
            }
            // Someone else reset or consumed in between; load again.
        }

        Err(Error::Quota(QuotaError::Unavailable(
            "rollover kept losing races".to_string(),
        )))
    }

    fn remember(&self, state: &QuotaState) {
        let mut guard = self.last_known.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(state.clone());
    }

    fn unavailable(err: Error) -> Error {
        match err {
            Error::Quota(_) => err,
            other => QuotaError::Unavailable(other.to_string()).into(),
        }
    }
}
