//! Provider trait definitions.

use async_trait::async_trait;

use crate::models::ProviderCall;

/// A source of daily price series.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use stockpulse_market_data::provider::DailySeriesProvider;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl DailySeriesProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch_daily(&self, symbol: &str) -> ProviderCall {
///         // one HTTP request, classified
///     }
/// }
/// ```
#[async_trait]
pub trait DailySeriesProvider: Send + Sync {
    /// Unique identifier, used for quota bookkeeping and logs.
    fn id(&self) -> &'static str;

    /// Perform one request for the full daily series of `symbol`.
    ///
    /// Must not retry. The returned envelope carries the outcome in
    /// `result` along with the audit details of the attempt.
    async fn fetch_daily(&self, symbol: &str) -> ProviderCall;
}
