//! StockPulse Market Data Crate
//!
//! Fetches daily OHLCV series from external providers and classifies each
//! response into one of three shapes:
//!
//! - a well-formed series (success)
//! - a soft-limit or informational note delivered with a successful
//!   transport status ([`MarketDataError::SoftLimit`])
//! - a malformed or empty payload (data error)
//!
//! Nothing here touches storage or quota. See `stockpulse-core` for the
//! metered client that wraps these providers.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::{DailyBar, DailySeries, ProviderCall, ProviderId};
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::DailySeriesProvider;
