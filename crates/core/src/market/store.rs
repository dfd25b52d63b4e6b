use super::model::PriceWindow;
use crate::errors::Result;

/// Read queries behind the market views.
pub trait MarketViewStore: Send + Sync {
    /// Latest two points for every active entity that has history.
    fn price_windows(&self) -> Result<Vec<PriceWindow>>;

    fn price_window(&self, symbol: &str) -> Result<Option<PriceWindow>>;
}
