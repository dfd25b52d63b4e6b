use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stockpulse_market_data::ProviderCall;

use crate::constants::RESPONSE_SNIPPET_CHARS;

/// One physical call to an external provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: String,
    pub service: String,
    pub endpoint: String,
    /// Request parameters as a JSON object, secrets removed.
    pub params: String,
    pub http_status: Option<i32>,
    pub response_snippet: Option<String>,
    pub error: Option<String>,
    pub latency_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn from_call(service: &str, call: &ProviderCall, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            service: service.to_string(),
            endpoint: call.endpoint.clone(),
            params: call.params_json().to_string(),
            http_status: call.http_status.map(i32::from),
            response_snippet: call.body.as_deref().map(truncate_snippet),
            error: call.result.as_ref().err().map(|e| e.to_string()),
            latency_ms: call.latency.as_millis().min(i64::MAX as u128) as i64,
            created_at: now,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Keeps at most [`RESPONSE_SNIPPET_CHARS`] characters.
pub fn truncate_snippet(body: &str) -> String {
    match body.char_indices().nth(RESPONSE_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Aggregated call counts for one day and endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub day: NaiveDate,
    pub endpoint: String,
    pub total: i64,
    pub successful: i64,
    pub failed: i64,
    pub avg_latency_ms: f64,
}
