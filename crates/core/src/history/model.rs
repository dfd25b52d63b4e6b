use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored daily bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adjusted_close: Decimal,
    pub volume: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of one [`HistoryStore::save_series`](super::HistoryStore::save_series).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// Total points stored for the entity after the write.
    pub history_count: i64,
    pub has_sufficient_data: bool,
}

/// Completeness derived from a history count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completeness {
    pub has_sufficient_data: bool,
    pub data_quality_score: i32,
}

impl Completeness {
    pub fn evaluate(history_count: i64, min_points: i64) -> Self {
        Self {
            has_sufficient_data: history_count >= min_points,
            data_quality_score: history_count.clamp(0, 100) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completeness_threshold() {
        assert!(!Completeness::evaluate(29, 30).has_sufficient_data);
        assert!(Completeness::evaluate(30, 30).has_sufficient_data);
    }

    #[test]
    fn test_quality_score_is_capped() {
        assert_eq!(Completeness::evaluate(0, 30).data_quality_score, 0);
        assert_eq!(Completeness::evaluate(57, 30).data_quality_score, 57);
        assert_eq!(Completeness::evaluate(4_000, 30).data_quality_score, 100);
    }
}
