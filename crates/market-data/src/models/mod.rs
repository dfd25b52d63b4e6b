//! Market data models
//!
//! - `series` - Daily OHLCV bars and the per-symbol series returned by a provider
//! - `call` - The audit envelope of one physical provider call

mod call;
mod series;

pub use call::ProviderCall;
pub use series::{DailyBar, DailySeries};

/// Provider identifier (e.g. "ALPHA_VANTAGE").
pub type ProviderId = &'static str;
