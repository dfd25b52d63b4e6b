use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MAX_RECENT_ERRORS, MIN_HISTORY_POINTS,
};
use crate::errors::Error;
use crate::quota::QuotaStatus;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub min_history_points: i64,
    pub max_batch_size: usize,
    pub default_batch_size: usize,
    /// Delay between entities in a batch.
    pub batch_pacing: Duration,
    pub max_recent_errors: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            min_history_points: MIN_HISTORY_POINTS,
            max_batch_size: MAX_BATCH_SIZE,
            default_batch_size: DEFAULT_BATCH_SIZE,
            batch_pacing: Duration::from_secs(1),
            max_recent_errors: MAX_RECENT_ERRORS,
        }
    }
}

/// Per-entity sync state machine.
///
/// `Idle -> CheckingQuota -> SelectingTarget -> Fetching -> Writing ->
/// Invalidating -> Done`, with an exit to `Failed` from any state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "phase", content = "reason")]
pub enum SyncPhase {
    Idle,
    CheckingQuota,
    SelectingTarget,
    Fetching,
    Writing,
    Invalidating,
    Done,
    Failed(String),
}

impl SyncPhase {
    pub fn can_transition_to(&self, next: &SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (self, next),
            (Idle, CheckingQuota)
                | (CheckingQuota, SelectingTarget)
                | (SelectingTarget, Fetching)
                | (Fetching, Writing)
                | (Writing, Invalidating)
                | (Invalidating, Done)
        ) || (matches!(next, Failed(_)) && !self.is_terminal())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::CheckingQuota => "checking_quota",
            SyncPhase::SelectingTarget => "selecting_target",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Writing => "writing",
            SyncPhase::Invalidating => "invalidating",
            SyncPhase::Done => "done",
            SyncPhase::Failed(_) => "failed",
        }
    }
}

/// Coarse failure category reported per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    QuotaExhausted,
    ProviderSoftLimit,
    ProviderData,
    ProviderTransport,
    Storage,
    Other,
}

impl From<&Error> for SyncErrorKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Quota(_) => SyncErrorKind::QuotaExhausted,
            Error::MarketData(e) if e.is_soft_limit() => SyncErrorKind::ProviderSoftLimit,
            Error::MarketData(e) if e.is_data_error() => SyncErrorKind::ProviderData,
            Error::MarketData(_) => SyncErrorKind::ProviderTransport,
            Error::Database(_) => SyncErrorKind::Storage,
            _ => SyncErrorKind::Other,
        }
    }
}

/// Outcome of one successful entity sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub symbol: String,
    pub records_inserted: usize,
    pub records_updated: usize,
    pub history_count: i64,
    pub has_sufficient_data: bool,
    pub fetch_ms: u64,
    pub write_ms: u64,
}

/// Per-entity line of a batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySyncDetail {
    pub symbol: String,
    /// Position in the selector's order.
    pub priority: usize,
    pub success: bool,
    pub phase: SyncPhase,
    pub error_kind: Option<SyncErrorKind>,
    pub error_message: Option<String>,
    pub records_inserted: usize,
    pub records_updated: usize,
    pub fetch_ms: u64,
    pub write_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub requested: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Candidates selected but never fetched (quota, cancellation or cap).
    pub not_attempted: usize,
    pub quota_exhausted: bool,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub message: String,
    pub details: Vec<EntitySyncDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorEntry {
    pub at: DateTime<Utc>,
    pub symbol: Option<String>,
    pub kind: SyncErrorKind,
    pub message: String,
}

/// Periodic scheduler status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub next_sync: Option<DateTime<Utc>>,
    pub total_entities: usize,
    pub processed_today: usize,
    /// Most recent errors, oldest first.
    pub recent_errors: Vec<SyncErrorEntry>,
}

/// Data coverage across all active entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStatus {
    pub total_entities: usize,
    pub with_sufficient_data: usize,
    pub needing_data: usize,
    pub percent_complete: f64,
    pub pending_preview: Vec<String>,
    pub quota: Option<QuotaStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QuotaError;
    use stockpulse_market_data::MarketDataError;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            SyncPhase::Idle,
            SyncPhase::CheckingQuota,
            SyncPhase::SelectingTarget,
            SyncPhase::Fetching,
            SyncPhase::Writing,
            SyncPhase::Invalidating,
            SyncPhase::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_no_skipping_and_no_leaving_terminal_states() {
        assert!(!SyncPhase::CheckingQuota.can_transition_to(&SyncPhase::Fetching));
        assert!(!SyncPhase::Fetching.can_transition_to(&SyncPhase::Done));
        assert!(!SyncPhase::Done.can_transition_to(&SyncPhase::Failed("x".into())));
        assert!(SyncPhase::Writing.can_transition_to(&SyncPhase::Failed("x".into())));
    }

    #[test]
    fn test_error_kind_mapping() {
        let quota: Error = QuotaError::Exhausted { used: 1, limit: 1 }.into();
        assert_eq!(SyncErrorKind::from(&quota), SyncErrorKind::QuotaExhausted);

        let soft: Error = MarketDataError::SoftLimit {
            provider: "P".into(),
            message: "note".into(),
        }
        .into();
        assert_eq!(SyncErrorKind::from(&soft), SyncErrorKind::ProviderSoftLimit);

        let data: Error = MarketDataError::EmptySeries { symbol: "X".into() }.into();
        assert_eq!(SyncErrorKind::from(&data), SyncErrorKind::ProviderData);

        let transport: Error = MarketDataError::Timeout { provider: "P".into() }.into();
        assert_eq!(SyncErrorKind::from(&transport), SyncErrorKind::ProviderTransport);
    }
}
