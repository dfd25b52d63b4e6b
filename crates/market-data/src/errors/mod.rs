//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum for a single provider call
//! - [`RetryClass`]: Classification for determining when a retry makes sense

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during a single provider call.
///
/// Errors fall into three families that callers must keep apart:
/// transport failures, soft-limit signals carried inside a successful
/// response, and data errors where the payload holds no usable series.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider answered with an error message about the symbol.
    /// Usually a bad or delisted ticker.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The response parsed but held no time series at all.
    #[error("Empty series for {symbol}")]
    EmptySeries { symbol: String },

    /// The response body could not be decoded.
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    /// The provider rejected the request at transport level (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The transport succeeded but the payload carried a rate-limit or
    /// informational note instead of data.
    #[error("Provider notice from {provider}: {message}")]
    SoftLimit { provider: String, message: String },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Non-success HTTP status or another provider-side failure.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// ```
    /// use stockpulse_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::SoftLimit {
    ///     provider: "ALPHA_VANTAGE".to_string(),
    ///     message: "Thank you for using Alpha Vantage!".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextOpportunity);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::SymbolNotFound(_) | Self::EmptySeries { .. } | Self::InvalidPayload { .. } => {
                RetryClass::Never
            }

            Self::RateLimited { .. } | Self::SoftLimit { .. } => RetryClass::NextOpportunity,

            Self::Timeout { .. } | Self::ProviderError { .. } | Self::Network(_) => {
                RetryClass::Transient
            }
        }
    }

    /// True for a provider refusal embedded in the response rather than a
    /// genuine absence of data.
    pub fn is_soft_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::SoftLimit { .. })
    }

    /// True when the payload itself was unusable.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::SymbolNotFound(_) | Self::EmptySeries { .. } | Self::InvalidPayload { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_errors_never_retry() {
        assert_eq!(
            MarketDataError::SymbolNotFound("XYZ".to_string()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            MarketDataError::EmptySeries {
                symbol: "XYZ".to_string()
            }
            .retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            MarketDataError::InvalidPayload {
                message: "eof".to_string()
            }
            .retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_soft_limits_wait_for_next_opportunity() {
        let note = MarketDataError::SoftLimit {
            provider: "ALPHA_VANTAGE".to_string(),
            message: "API call frequency".to_string(),
        };
        assert_eq!(note.retry_class(), RetryClass::NextOpportunity);
        assert!(note.is_soft_limit());
        assert!(!note.is_data_error());

        let http = MarketDataError::RateLimited {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(http.retry_class(), RetryClass::NextOpportunity);
        assert!(http.is_soft_limit());
    }

    #[test]
    fn test_transport_errors_are_transient() {
        assert_eq!(
            MarketDataError::Timeout {
                provider: "ALPHA_VANTAGE".to_string()
            }
            .retry_class(),
            RetryClass::Transient
        );
        assert_eq!(
            MarketDataError::ProviderError {
                provider: "ALPHA_VANTAGE".to_string(),
                message: "HTTP 502".to_string()
            }
            .retry_class(),
            RetryClass::Transient
        );
    }

    #[test]
    fn test_soft_limit_and_data_error_are_disjoint() {
        let empty = MarketDataError::EmptySeries {
            symbol: "AAPL".to_string(),
        };
        assert!(empty.is_data_error());
        assert!(!empty.is_soft_limit());
    }
}
