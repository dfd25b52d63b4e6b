use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::model::{
    BatchResult, CoverageStatus, EntitySyncDetail, SchedulerStatus, SyncConfig, SyncErrorEntry,
    SyncErrorKind, SyncPhase, SyncReport,
};
use crate::calls::ProviderClient;
use crate::clock::Clock;
use crate::entities::{EntityStore, TrackedEntity};
use crate::errors::{Error, QuotaError, Result};
use crate::history::HistoryWriter;
use crate::priority::{EntityPriority, PrioritySelector};
use crate::quota::{QuotaLedger, QuotaStatus};

/// Tracks one invocation through [`SyncPhase`].
struct PhaseTracker {
    label: String,
    phase: SyncPhase,
}

impl PhaseTracker {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            phase: SyncPhase::Idle,
        }
    }

    fn advance(&mut self, next: SyncPhase) {
        debug_assert!(
            self.phase.can_transition_to(&next),
            "illegal sync transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!("sync {}: {} -> {}", self.label, self.phase.as_str(), next.as_str());
        self.phase = next;
    }

    fn fail(&mut self, err: &Error) {
        if !self.phase.is_terminal() {
            debug!("sync {}: {} -> failed ({})", self.label, self.phase.as_str(), err);
            self.phase = SyncPhase::Failed(err.to_string());
        }
    }
}

#[derive(Debug, Default)]
struct SchedulerState {
    is_running: bool,
    last_sync: Option<DateTime<Utc>>,
    next_sync: Option<DateTime<Utc>>,
    processed_day: Option<NaiveDate>,
    processed_today: usize,
}

/// Drives periodic and batch synchronization.
pub struct SyncService {
    selector: PrioritySelector,
    entities: Arc<dyn EntityStore>,
    ledger: Arc<QuotaLedger>,
    client: ProviderClient,
    writer: HistoryWriter,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    state: RwLock<SchedulerState>,
    recent_errors: Mutex<VecDeque<SyncErrorEntry>>,
}

impl SyncService {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        ledger: Arc<QuotaLedger>,
        client: ProviderClient,
        writer: HistoryWriter,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            selector: PrioritySelector::new(entities.clone(), config.min_history_points),
            entities,
            ledger,
            client,
            writer,
            clock,
            config,
            state: RwLock::new(SchedulerState::default()),
            recent_errors: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // =========================================================================
    // Read-only status
    // =========================================================================

    pub async fn can_sync_now(&self) -> bool {
        self.ledger.can_proceed().await
    }

    pub async fn current_quota(&self) -> Result<QuotaStatus> {
        self.ledger.current().await
    }

    pub fn pending_entities(&self, limit: usize) -> Result<Vec<EntityPriority>> {
        self.selector.pending(limit)
    }

    pub fn status(&self) -> SchedulerStatus {
        let total_entities = match self.entities.list_active() {
            Ok(list) => list.len(),
            Err(e) => {
                warn!("Could not count entities for status: {}", e);
                0
            }
        };
        let today = self.clock.now().date_naive();
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let recent_errors = self
            .recent_errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect();

        SchedulerStatus {
            is_running: state.is_running,
            last_sync: state.last_sync,
            next_sync: state.next_sync,
            total_entities,
            processed_today: if state.processed_day == Some(today) {
                state.processed_today
            } else {
                0
            },
            recent_errors,
        }
    }

    pub async fn coverage(&self) -> Result<CoverageStatus> {
        let ranked = self.selector.ranked()?;
        let total = ranked.len();
        let with_sufficient_data = ranked.iter().filter(|p| p.has_sufficient_data).count();
        let pending_preview = ranked
            .iter()
            .filter(|p| !p.has_sufficient_data)
            .take(10)
            .map(|p| p.symbol.clone())
            .collect();
        let quota = match self.ledger.current().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Quota unavailable for coverage report: {}", e);
                None
            }
        };

        Ok(CoverageStatus {
            total_entities: total,
            with_sufficient_data,
            needing_data: total - with_sufficient_data,
            percent_complete: if total == 0 {
                100.0
            } else {
                with_sufficient_data as f64 * 100.0 / total as f64
            },
            pending_preview,
            quota,
        })
    }

    /// Called by the scheduler when it starts and stops.
    pub fn mark_running(&self, running: bool) {
        self.state.write().unwrap_or_else(|e| e.into_inner()).is_running = running;
    }

    pub fn set_next_sync(&self, at: Option<DateTime<Utc>>) {
        self.state.write().unwrap_or_else(|e| e.into_inner()).next_sync = at;
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Manual sync of one entity, subject to quota.
    pub async fn trigger_single(&self, symbol: &str) -> Result<SyncReport> {
        let symbol = symbol.trim().to_uppercase();
        let mut tracker = PhaseTracker::new(&symbol);

        tracker.advance(SyncPhase::CheckingQuota);
        if let Err(e) = self.ledger.check().await {
            tracker.fail(&e);
            return Err(e);
        }

        tracker.advance(SyncPhase::SelectingTarget);
        let entity = match self.lookup(&symbol) {
            Ok(entity) => entity,
            Err(e) => {
                tracker.fail(&e);
                return Err(e);
            }
        };

        let result = self.sync_entity(&entity, &mut tracker).await;
        self.settle(&entity.symbol, &mut tracker, result)
    }

    /// One periodic tick: at most one entity.
    ///
    /// Returns `Ok(None)` when the gate is closed or nothing is eligible.
    pub async fn run_periodic_tick(&self) -> Result<Option<SyncReport>> {
        let mut tracker = PhaseTracker::new("periodic");

        tracker.advance(SyncPhase::CheckingQuota);
        if let Err(e) = self.ledger.check().await {
            tracker.fail(&e);
            if matches!(e, Error::Quota(QuotaError::Unavailable(_))) {
                self.record_error(None, &e);
            }
            info!("Periodic sync skipped: {}", e);
            return Ok(None);
        }

        tracker.advance(SyncPhase::SelectingTarget);
        let target = match self.selector.periodic_target() {
            Ok(Some(target)) => target,
            Ok(None) => {
                info!("Periodic sync: no active entities");
                return Ok(None);
            }
            Err(e) => {
                tracker.fail(&e);
                self.record_error(None, &e);
                return Err(e);
            }
        };
        info!(
            "Periodic sync selected {} (rank {}, {} points stored)",
            target.symbol, target.rank, target.history_count
        );

        let entity = match self.lookup(&target.symbol) {
            Ok(entity) => entity,
            Err(e) => {
                tracker.fail(&e);
                self.record_error(Some(&target.symbol), &e);
                return Err(e);
            }
        };

        let result = self.sync_entity(&entity, &mut tracker).await;
        match self.settle(&entity.symbol, &mut tracker, result) {
            Ok(report) => Ok(Some(report)),
            Err(e) if e.is_quota_denial() => {
                info!("Periodic sync for {} denied by quota: {}", entity.symbol, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Syncs up to `min(max_entities, cap, remaining quota)` pending entities.
    ///
    /// Individual failures are collected in the result. A quota denial or
    /// cancellation stops the loop; the remaining candidates are reported
    /// as not attempted. Only a failure to select candidates returns `Err`.
    pub async fn trigger_batch(
        &self,
        max_entities: usize,
        cancel: &CancellationToken,
    ) -> Result<BatchResult> {
        let started_at = self.clock.now();
        let timer = Instant::now();
        let requested = max_entities.min(self.config.max_batch_size);

        let candidates = self.selector.pending(requested)?;
        let available = match self.ledger.current().await {
            Ok(status) if status.can_proceed => {
                let hourly = status.hourly_remaining.unwrap_or(status.remaining);
                status.remaining.min(hourly).max(0) as usize
            }
            Ok(_) => 0,
            Err(e) => {
                warn!("Quota unavailable at batch start, denying: {}", e);
                0
            }
        };
        let budget = requested.min(available);

        info!(
            "Batch sync: {} requested, {} candidates, {} calls available",
            requested,
            candidates.len(),
            available
        );

        let mut details: Vec<EntitySyncDetail> = Vec::new();
        // Set when remaining quota, not the candidate list, bounds the batch.
        let mut quota_exhausted = available < candidates.len();
        let mut cancelled = false;

        for candidate in candidates.iter().take(budget) {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if !details.is_empty() && !self.config.batch_pacing.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.config.batch_pacing) => {}
                }
            }

            match self.sync_candidate(candidate).await {
                Some(detail) => details.push(detail),
                None => {
                    quota_exhausted = true;
                    break;
                }
            }
        }

        let attempted = details.len();
        let succeeded = details.iter().filter(|d| d.success).count();
        let failed = attempted - succeeded;
        let not_attempted = candidates.len() - attempted;

        let message = if candidates.is_empty() {
            "All active entities have sufficient data".to_string()
        } else if quota_exhausted && attempted == 0 {
            "Quota exhausted; no entities attempted".to_string()
        } else {
            format!(
                "Batch sync finished: {} succeeded, {} failed, {} not attempted{}{}",
                succeeded,
                failed,
                not_attempted,
                if quota_exhausted { " (quota exhausted)" } else { "" },
                if cancelled { " (cancelled)" } else { "" }
            )
        };
        info!("{}", message);

        Ok(BatchResult {
            requested,
            attempted,
            succeeded,
            failed,
            not_attempted,
            quota_exhausted,
            cancelled,
            started_at,
            finished_at: self.clock.now(),
            duration_ms: timer.elapsed().as_millis() as u64,
            message,
            details,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Runs one batch candidate. Returns `None` on a quota denial, which
    /// ends the batch without counting as a failure.
    async fn sync_candidate(&self, candidate: &EntityPriority) -> Option<EntitySyncDetail> {
        let started = Instant::now();
        let mut tracker = PhaseTracker::new(&candidate.symbol);

        tracker.advance(SyncPhase::CheckingQuota);
        if let Err(e) = self.ledger.check().await {
            tracker.fail(&e);
            info!("Batch stopped before {}: {}", candidate.symbol, e);
            return None;
        }

        tracker.advance(SyncPhase::SelectingTarget);
        let result = match self.lookup(&candidate.symbol) {
            Ok(entity) => self.sync_entity(&entity, &mut tracker).await,
            Err(e) => Err(e),
        };

        let result = match result {
            Err(e) if e.is_quota_denial() => {
                tracker.fail(&e);
                info!("Batch stopped at {}: {}", candidate.symbol, e);
                return None;
            }
            other => self.settle(&candidate.symbol, &mut tracker, other),
        };

        let total_ms = started.elapsed().as_millis() as u64;
        Some(match result {
            Ok(report) => EntitySyncDetail {
                symbol: candidate.symbol.clone(),
                priority: candidate.rank,
                success: true,
                phase: tracker.phase,
                error_kind: None,
                error_message: None,
                records_inserted: report.records_inserted,
                records_updated: report.records_updated,
                fetch_ms: report.fetch_ms,
                write_ms: report.write_ms,
                total_ms,
            },
            Err(e) => EntitySyncDetail {
                symbol: candidate.symbol.clone(),
                priority: candidate.rank,
                success: false,
                phase: tracker.phase,
                error_kind: Some(SyncErrorKind::from(&e)),
                error_message: Some(e.to_string()),
                records_inserted: 0,
                records_updated: 0,
                fetch_ms: 0,
                write_ms: 0,
                total_ms,
            },
        })
    }

    /// Fetch, write, invalidate. Strictly sequential.
    async fn sync_entity(
        &self,
        entity: &TrackedEntity,
        tracker: &mut PhaseTracker,
    ) -> Result<SyncReport> {
        tracker.advance(SyncPhase::Fetching);
        let fetch_started = Instant::now();
        let series = self.client.fetch(&entity.symbol).await?;
        let fetch_ms = fetch_started.elapsed().as_millis() as u64;

        tracker.advance(SyncPhase::Writing);
        let write_started = Instant::now();
        let outcome = self.writer.write(entity, &series).await?;
        let write_ms = write_started.elapsed().as_millis() as u64;

        tracker.advance(SyncPhase::Invalidating);
        self.writer.invalidate(entity).await;

        tracker.advance(SyncPhase::Done);
        Ok(SyncReport {
            symbol: entity.symbol.clone(),
            records_inserted: outcome.inserted,
            records_updated: outcome.updated,
            history_count: outcome.history_count,
            has_sufficient_data: outcome.has_sufficient_data,
            fetch_ms,
            write_ms,
        })
    }

    fn lookup(&self, symbol: &str) -> Result<TrackedEntity> {
        match self.entities.get(symbol)? {
            Some(entity) if entity.is_active => Ok(entity),
            Some(_) => Err(Error::Validation(format!("{} is not active", symbol))),
            None => Err(Error::NotFound(format!("entity {}", symbol))),
        }
    }

    /// Records the outcome of a finished invocation.
    fn settle(
        &self,
        symbol: &str,
        tracker: &mut PhaseTracker,
        result: Result<SyncReport>,
    ) -> Result<SyncReport> {
        match result {
            Ok(report) => {
                let now = self.clock.now();
                let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                state.last_sync = Some(now);
                if state.processed_day != Some(now.date_naive()) {
                    state.processed_day = Some(now.date_naive());
                    state.processed_today = 0;
                }
                state.processed_today += 1;
                Ok(report)
            }
            Err(e) => {
                tracker.fail(&e);
                if e.is_quota_denial() {
                    info!("Sync for {} denied by quota: {}", symbol, e);
                } else {
                    error!("Sync for {} failed: {}", symbol, e);
                    self.record_error(Some(symbol), &e);
                }
                Err(e)
            }
        }
    }

    fn record_error(&self, symbol: Option<&str>, err: &Error) {
        let entry = SyncErrorEntry {
            at: self.clock.now(),
            symbol: symbol.map(str::to_string),
            kind: SyncErrorKind::from(err),
            message: err.to_string(),
        };
        let mut errors = self.recent_errors.lock().unwrap_or_else(|e| e.into_inner());
        errors.push_back(entry);
        while errors.len() > self.config.max_recent_errors {
            errors.pop_front();
        }
    }
}
