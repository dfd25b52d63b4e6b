use std::time::Duration;

use crate::errors::MarketDataError;

use super::series::DailySeries;

/// Everything observed during one physical provider call.
///
/// Providers return this envelope even when the call fails so the caller
/// can persist an audit record for every attempt.
#[derive(Debug)]
pub struct ProviderCall {
    /// Provider identifier.
    pub provider: &'static str,
    /// Logical endpoint name (e.g. `TIME_SERIES_DAILY`).
    pub endpoint: String,
    /// Request parameters with secrets removed.
    pub params: Vec<(String, String)>,
    /// HTTP status when a response was received.
    pub http_status: Option<u16>,
    /// Raw response body when one was read.
    pub body: Option<String>,
    /// Wall time spent on the call.
    pub latency: Duration,
    pub result: Result<DailySeries, MarketDataError>,
}

impl ProviderCall {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Request parameters as a JSON object for storage.
    pub fn params_json(&self) -> serde_json::Value {
        let map = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}
