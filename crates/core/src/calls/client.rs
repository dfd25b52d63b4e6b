//! Metered provider client.

use chrono::Duration;
use log::{debug, info, warn};
use std::sync::Arc;
use stockpulse_market_data::{DailySeries, DailySeriesProvider};

use super::model::CallRecord;
use super::store::CallLogStore;
use crate::clock::Clock;
use crate::errors::{Error, Result};
use crate::quota::QuotaLedger;

/// Wraps a provider with the quota gate and the audit log.
///
/// For every invocation either the gate denies and nothing else happens, or
/// exactly one unit of quota is consumed, exactly one network call is made
/// and exactly one [`CallRecord`] is appended. There is no internal retry.
///
/// The metered sequence runs on its own task, so a caller that stops
/// waiting (a timed-out request, a disconnected client) cannot leave a
/// charged unit without its record.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn DailySeriesProvider>,
    ledger: Arc<QuotaLedger>,
    calls: Arc<dyn CallLogStore>,
    clock: Arc<dyn Clock>,
}

impl ProviderClient {
    pub fn new(
        provider: Arc<dyn DailySeriesProvider>,
        ledger: Arc<QuotaLedger>,
        calls: Arc<dyn CallLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            ledger,
            calls,
            clock,
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    /// Fetches the daily series for `symbol`.
    ///
    /// A denied gate returns [`Error::Quota`]. Provider failures of any shape
    /// return [`Error::MarketData`] after the attempt has been recorded.
    pub async fn fetch(&self, symbol: &str) -> Result<DailySeries> {
        let client = self.clone();
        let symbol = symbol.to_string();
        match tokio::spawn(async move { client.metered_fetch(&symbol).await }).await {
            Ok(result) => result,
            Err(e) => Err(Error::Unexpected(format!("provider call task failed: {}", e))),
        }
    }

    async fn metered_fetch(&self, symbol: &str) -> Result<DailySeries> {
        let state = self.ledger.acquire().await?;
        debug!(
            "Fetching {} from {} ({}/{} calls used)",
            symbol,
            self.provider.id(),
            state.daily_used,
            state.daily_limit
        );

        let call = self.provider.fetch_daily(symbol).await;

        let record = CallRecord::from_call(self.ledger.service(), &call, self.clock.now());
        if let Err(e) = self.calls.append(&record).await {
            // The quota is already spent; losing the audit row must not
            // hide the outcome from the caller.
            warn!("Failed to record call {} for {}: {}", record.id, symbol, e);
        }

        match call.result {
            Ok(series) => Ok(series),
            Err(e) => {
                warn!(
                    "Provider call for {} failed after {}ms ({}): {} | body: {}",
                    symbol,
                    call.latency.as_millis(),
                    e.retry_class().as_str(),
                    e,
                    call.body
                        .as_deref()
                        .map(|b| b.chars().take(200).collect::<String>())
                        .unwrap_or_default()
                );
                Err(Error::MarketData(e))
            }
        }
    }
}

/// Deletes call records older than `retention_days`.
pub async fn sweep_call_log(
    calls: &dyn CallLogStore,
    clock: &dyn Clock,
    retention_days: i64,
) -> Result<usize> {
    let cutoff = clock.now() - Duration::days(retention_days);
    let removed = calls.purge_older_than(cutoff).await?;
    if removed > 0 {
        info!("Removed {} call records older than {}", removed, cutoff);
    }
    Ok(removed)
}
