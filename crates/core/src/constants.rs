/// Provider service name used as the quota ledger key.
pub const ALPHA_VANTAGE_SERVICE: &str = "alpha_vantage";

/// An entity is complete once it has at least this many history points.
pub const MIN_HISTORY_POINTS: i64 = 30;

/// Free-tier daily call budget.
pub const DEFAULT_DAILY_LIMIT: i32 = 25;

/// Hard cap on entities per batch request.
pub const MAX_BATCH_SIZE: usize = 25;

/// Batch size used when the caller does not pass one.
pub const DEFAULT_BATCH_SIZE: usize = 24;

/// Default limit for pending-entity listings.
pub const DEFAULT_PENDING_LIMIT: usize = 25;

/// Number of recent sync errors kept for status reads.
pub const MAX_RECENT_ERRORS: usize = 20;

/// Call records older than this are swept.
pub const CALL_LOG_RETENTION_DAYS: i64 = 30;

/// Response bodies are truncated to this many characters in the call log.
pub const RESPONSE_SNIPPET_CHARS: usize = 2_000;

/// Read-path cache lifetime.
pub const CACHE_TTL_SECS: u64 = 55 * 60;

/// Entries per performance ranking.
pub const RANKING_SIZE: usize = 10;

/// Page size for entity listings when the caller does not pass one.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page an entity listing will return.
pub const MAX_PAGE_SIZE: usize = 200;
