//! Alpha Vantage daily series provider.
//!
//! Uses the `TIME_SERIES_DAILY` endpoint. The free tier answers over-budget
//! requests with HTTP 200 and a `Note` or `Information` field in place of
//! the series, so those bodies are classified as soft limits rather than
//! empty results.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::errors::MarketDataError;
use crate::models::{DailyBar, DailySeries, ProviderCall};
use crate::provider::DailySeriesProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";
const ENDPOINT: &str = "TIME_SERIES_DAILY";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much history to request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 points.
    Compact,
    /// Full history.
    #[default]
    Full,
}

impl OutputSize {
    fn as_param(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Alpha Vantage provider for daily equity series.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
    output_size: OutputSize,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// TIME_SERIES_DAILY response envelope
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyQuote>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyQuote {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

// ============================================================================
// AlphaVantageProvider implementation
// ============================================================================

impl AlphaVantageProvider {
    /// Create a new provider with the given API key and a 30 second timeout.
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stockpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            output_size: OutputSize::default(),
        }
    }

    /// Point the provider at a different host. Used by tests and proxies.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
        self.output_size = output_size;
        self
    }

    /// Send one request. Returns the HTTP status when a response arrived.
    async fn send(&self, params: &[(&str, &str)]) -> (Option<u16>, Result<String, MarketDataError>) {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let url = match reqwest::Url::parse_with_params(&self.base_url, &all_params) {
            Ok(url) => url,
            Err(e) => {
                return (
                    None,
                    Err(MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("Failed to build URL: {}", e),
                    }),
                )
            }
        };

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return (
                    None,
                    Err(MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }),
                )
            }
            Err(e) => return (None, Err(MarketDataError::Network(e))),
        };

        let status = response.status();
        let code = Some(status.as_u16());
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return (
                code,
                Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                }),
            );
        }

        if !status.is_success() {
            return (
                code,
                Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("HTTP {}", status),
                }),
            );
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        });
        (code, text)
    }

    /// Classify a response body into a series or one of the error shapes.
    pub(crate) fn parse_daily_series(
        symbol: &str,
        text: &str,
    ) -> Result<DailySeries, MarketDataError> {
        let response: TimeSeriesResponse =
            serde_json::from_str(text).map_err(|e| MarketDataError::InvalidPayload {
                message: format!("Failed to parse response: {}", e),
            })?;

        if let Some(msg) = response.error_message {
            return Err(MarketDataError::SymbolNotFound(msg));
        }

        match response.time_series {
            Some(series) if !series.is_empty() => {
                if let Some(ref msg) = response.note {
                    warn!("Alpha Vantage note alongside data for {}: {}", symbol, msg);
                }
                Self::convert(symbol, series)
            }
            _ => {
                // A note in place of data is a refusal, not an empty result
                if let Some(msg) = response.note.or(response.information) {
                    return Err(MarketDataError::SoftLimit {
                        provider: PROVIDER_ID.to_string(),
                        message: msg,
                    });
                }
                Err(MarketDataError::EmptySeries {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    fn convert(
        symbol: &str,
        time_series: HashMap<String, DailyQuote>,
    ) -> Result<DailySeries, MarketDataError> {
        let total = time_series.len();
        let bars: Vec<DailyBar> = time_series
            .into_iter()
            .filter_map(|(date_str, daily)| {
                let date = Self::parse_date(&date_str)?;
                Some(DailyBar::unadjusted(
                    date,
                    Self::parse_decimal(&daily.open)?,
                    Self::parse_decimal(&daily.high)?,
                    Self::parse_decimal(&daily.low)?,
                    Self::parse_decimal(&daily.close)?,
                    Self::parse_volume(&daily.volume)?,
                ))
            })
            .collect();

        if bars.is_empty() {
            return Err(MarketDataError::InvalidPayload {
                message: format!("No parseable rows in {} entries for {}", total, symbol),
            });
        }
        if bars.len() < total {
            debug!(
                "Skipped {} unparseable rows for {}",
                total - bars.len(),
                symbol
            );
        }

        Ok(DailySeries::new(symbol, bars))
    }

    /// Parse a date string in YYYY-MM-DD format.
    fn parse_date(date_str: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
    }

    fn parse_decimal(s: &str) -> Option<Decimal> {
        Decimal::from_str(s.trim()).ok()
    }

    fn parse_volume(s: &str) -> Option<i64> {
        let s = s.trim();
        s.parse::<i64>()
            .ok()
            .or_else(|| Decimal::from_str(s).ok().and_then(|d| d.trunc().to_i64()))
    }
}

#[async_trait]
impl DailySeriesProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_daily(&self, symbol: &str) -> ProviderCall {
        let params = [
            ("function", ENDPOINT),
            ("symbol", symbol),
            ("outputsize", self.output_size.as_param()),
        ];

        let started = Instant::now();
        let (http_status, text) = self.send(&params).await;
        let (body, result) = match text {
            Ok(body) => {
                let result = Self::parse_daily_series(symbol, &body);
                (Some(body), result)
            }
            Err(e) => (None, Err(e)),
        };
        let latency = started.elapsed();

        match &result {
            Ok(series) => debug!(
                "Alpha Vantage returned {} bars for {} in {:?}",
                series.len(),
                symbol,
                latency
            ),
            Err(e) => warn!("Alpha Vantage call for {} failed after {:?}: {}", symbol, latency, e),
        }

        ProviderCall {
            provider: PROVIDER_ID,
            endpoint: ENDPOINT.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            http_status,
            body,
            latency,
            result,
        }
    }
}
