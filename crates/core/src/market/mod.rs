//! Read-path market views: entity list with price change, sectors, paging,
//! rankings and a market overview. Served through the cache.

pub mod model;
pub mod service;
pub mod store;

pub use model::{
    EntityPage, EntityView, MarketOverview, MarketSnapshot, PerformanceRankings, PricePoint,
    PriceWindow, SectorCount,
};
pub use service::MarketViewService;
pub use store::MarketViewStore;
