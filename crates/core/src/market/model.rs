use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Close and volume for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
    pub volume: i64,
}

/// The two most recent points for an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceWindow {
    pub symbol: String,
    pub latest: PricePoint,
    pub previous: Option<PricePoint>,
}

/// An entity as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub market_cap: Option<i64>,
    pub current_price: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub volume: Option<i64>,
    pub last_updated: Option<NaiveDate>,
    pub has_sufficient_data: bool,
}

/// Number of active entities in one sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorCount {
    pub name: String,
    pub count: usize,
}

/// One page of the entity listing, largest market cap first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage {
    pub stocks: Vec<EntityView>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRankings {
    pub gainers: Vec<EntityView>,
    pub losers: Vec<EntityView>,
    pub most_active: Vec<EntityView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub total_entities: usize,
    pub advancing: usize,
    pub declining: usize,
    pub unchanged: usize,
    pub average_change_percent: Decimal,
    pub last_updated: Option<NaiveDate>,
}

/// Everything the live feed publishes in one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub stocks: Vec<EntityView>,
    pub performance: PerformanceRankings,
    pub overview: MarketOverview,
}
