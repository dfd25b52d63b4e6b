use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A symbol the engine keeps history for.
///
/// Never hard-deleted; `is_active = false` takes it out of every selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    /// Importance metric used for ordering. `None` sorts last.
    pub market_cap: Option<i64>,
    pub is_active: bool,
    pub has_sufficient_data: bool,
    /// 0-100, capped count of history points.
    pub data_quality_score: i32,
    pub last_data_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seed input for [`EntityStore::seed`](super::EntityStore::seed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntity {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<i64>,
}

/// An active entity together with what is stored for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStats {
    pub entity: TrackedEntity,
    pub history_count: i64,
    pub latest_date: Option<NaiveDate>,
}

impl EntityStats {
    pub fn is_cold(&self) -> bool {
        self.history_count == 0
    }
}
