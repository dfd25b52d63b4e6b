//! Background jobs for the sync engine.
//!
//! Three independent loops share one cancellation token:
//! - the periodic single-entity sync
//! - an hourly quota refresh that applies day and hour rollover even when
//!   nothing else touches the ledger
//! - a daily call-log retention sweep

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use stockpulse_core::calls::sweep_call_log;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Delay before the first periodic sync so startup finishes first.
const INITIAL_DELAY: Duration = Duration::from_secs(60);

const QUOTA_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct SyncScheduler;

impl SyncScheduler {
    /// Spawns the background jobs. They stop when `shutdown` or the returned
    /// handle is cancelled.
    pub fn start(state: Arc<AppState>, shutdown: &CancellationToken) -> SchedulerHandle {
        let cancel = shutdown.child_token();
        let mut tasks = vec![
            tokio::spawn(quota_refresh_loop(state.clone(), cancel.clone())),
            tokio::spawn(retention_loop(state.clone(), cancel.clone())),
        ];

        if state.provider_configured {
            tasks.push(tokio::spawn(periodic_sync_loop(state.clone(), cancel.clone())));
            info!(
                "Sync scheduler started (every {:?})",
                state.sync_interval
            );
        } else {
            info!("Sync scheduler started without periodic sync; no provider key");
        }

        SchedulerHandle {
            state,
            cancel,
            tasks,
        }
    }
}

/// Owner handle for the scheduler's background tasks.
pub struct SchedulerHandle {
    state: Arc<AppState>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Cancels every job and waits up to `grace` for in-flight work.
    pub async fn stop(mut self, grace: Duration) {
        self.cancel.cancel();
        let deadline = Instant::now() + grace;
        for task in self.tasks.iter_mut() {
            if timeout_at(deadline, &mut *task).await.is_err() {
                warn!("Scheduler job did not stop within {:?}; aborting", grace);
                task.abort();
            }
        }
        self.state.sync_service.mark_running(false);
        self.state.sync_service.set_next_sync(None);
        info!("Sync scheduler stopped");
    }
}

fn next_tick_at(state: &AppState, after: Duration) -> Option<chrono::DateTime<chrono::Utc>> {
    let after = ChronoDuration::from_std(after).ok()?;
    Some(state.clock.now() + after)
}

async fn periodic_sync_loop(state: Arc<AppState>, cancel: CancellationToken) {
    let service = &state.sync_service;
    let period = state.sync_interval;
    let mut ticker = interval_at(Instant::now() + INITIAL_DELAY, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    service.mark_running(true);
    service.set_next_sync(next_tick_at(&state, INITIAL_DELAY));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match service.run_periodic_tick().await {
                    Ok(Some(report)) => info!(
                        "Periodic sync of {} stored {} new and {} updated points",
                        report.symbol, report.records_inserted, report.records_updated
                    ),
                    Ok(None) => debug!("Periodic sync had nothing to do"),
                    Err(e) => warn!("Periodic sync failed: {}", e),
                }
                service.set_next_sync(next_tick_at(&state, period));
            }
        }
    }
    service.mark_running(false);
    debug!("Periodic sync loop stopped");
}

async fn quota_refresh_loop(state: Arc<AppState>, cancel: CancellationToken) {
    let mut ticker = interval_at(
        Instant::now() + QUOTA_REFRESH_INTERVAL,
        QUOTA_REFRESH_INTERVAL,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => match state.ledger.refresh().await {
                Ok(quota) => debug!(
                    "Quota refreshed: {}/{} used",
                    quota.daily_used, quota.daily_limit
                ),
                Err(e) => warn!("Quota refresh failed: {}", e),
            },
        }
    }
    debug!("Quota refresh loop stopped");
}

async fn retention_loop(state: Arc<AppState>, cancel: CancellationToken) {
    // First sweep runs immediately so a long-stopped server catches up.
    let mut ticker = interval_at(Instant::now(), RETENTION_SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let result = sweep_call_log(
                    state.call_log.as_ref(),
                    state.clock.as_ref(),
                    state.call_log_retention_days,
                )
                .await;
                if let Err(e) = result {
                    warn!("Call log sweep failed: {}", e);
                }
            }
        }
    }
    debug!("Retention loop stopped");
}
