use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::model::{
    EntityPage, EntityView, MarketOverview, MarketSnapshot, PerformanceRankings, PriceWindow,
    SectorCount,
};
use super::store::MarketViewStore;
use crate::cache::{CacheKey, ReadThroughCache};
use crate::constants::{MAX_PAGE_SIZE, RANKING_SIZE};
use crate::entities::{EntityStore, TrackedEntity};
use crate::errors::{Error, Result};

/// Builds client-facing views from stored history.
pub struct MarketViewService {
    entities: Arc<dyn EntityStore>,
    prices: Arc<dyn MarketViewStore>,
    cache: ReadThroughCache,
}

impl MarketViewService {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        prices: Arc<dyn MarketViewStore>,
        cache: ReadThroughCache,
    ) -> Self {
        Self {
            entities,
            prices,
            cache,
        }
    }

    pub async fn list(&self) -> Result<Vec<EntityView>> {
        self.cache
            .get_or_load(&CacheKey::all_entities(), || async { self.load_views() })
            .await
    }

    pub async fn by_sector(&self, sector: &str) -> Result<Vec<EntityView>> {
        self.cache
            .get_or_load(&CacheKey::sector(sector), || async {
                Ok(self
                    .load_views()?
                    .into_iter()
                    .filter(|v| {
                        v.sector
                            .as_deref()
                            .is_some_and(|s| s.eq_ignore_ascii_case(sector))
                    })
                    .collect())
            })
            .await
    }

    /// Active entity count per sector, by sector name.
    pub async fn sectors(&self) -> Result<Vec<SectorCount>> {
        self.cache
            .get_or_load(&CacheKey::sectors(), || async {
                Ok(count_sectors(&self.entities.list_active()?))
            })
            .await
    }

    /// A window over the listing ordered by market cap. `limit` is capped at
    /// `MAX_PAGE_SIZE`.
    pub async fn page(&self, limit: usize, offset: usize) -> Result<EntityPage> {
        if limit == 0 {
            return Err(Error::Validation("page limit must be positive".to_string()));
        }
        Ok(paginate(self.list().await?, limit.min(MAX_PAGE_SIZE), offset))
    }

    /// Entities whose current price lies within the inclusive bounds,
    /// cheapest first. Entities without history are left out.
    pub async fn by_price_range(
        &self,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> Result<Vec<EntityView>> {
        validate_price_range(min, max)?;
        Ok(filter_price_range(self.list().await?, min, max))
    }

    pub async fn entity(&self, symbol: &str) -> Result<EntityView> {
        let symbol = symbol.to_uppercase();
        self.cache
            .get_or_load(&CacheKey::entity(&symbol), || async {
                let entity = self
                    .entities
                    .get(&symbol)?
                    .ok_or_else(|| Error::NotFound(format!("entity {}", symbol)))?;
                let window = self.prices.price_window(&symbol)?;
                Ok(build_view(&entity, window.as_ref()))
            })
            .await
    }

    pub async fn performance(&self) -> Result<PerformanceRankings> {
        self.cache
            .get_or_load(&CacheKey::performance(), || async {
                Ok(rank_performance(&self.list().await?, RANKING_SIZE))
            })
            .await
    }

    pub async fn overview(&self) -> Result<MarketOverview> {
        self.cache
            .get_or_load(&CacheKey::overview(), || async {
                Ok(summarize(&self.list().await?))
            })
            .await
    }

    /// Full state for the live feed.
    pub async fn snapshot(&self) -> Result<MarketSnapshot> {
        Ok(MarketSnapshot {
            stocks: self.list().await?,
            performance: self.performance().await?,
            overview: self.overview().await?,
        })
    }

    fn load_views(&self) -> Result<Vec<EntityView>> {
        let windows: HashMap<String, PriceWindow> = self
            .prices
            .price_windows()?
            .into_iter()
            .map(|w| (w.symbol.clone(), w))
            .collect();

        let mut entities = self.entities.list_active()?;
        entities.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(entities
            .iter()
            .map(|e| build_view(e, windows.get(&e.symbol)))
            .collect())
    }
}

pub(crate) fn build_view(entity: &TrackedEntity, window: Option<&PriceWindow>) -> EntityView {
    let (current_price, change, change_percent, volume, last_updated) = match window {
        Some(w) => {
            let latest = w.latest.close;
            let (change, pct) = match &w.previous {
                Some(prev) => {
                    let change = latest - prev.close;
                    let pct = (!prev.close.is_zero())
                        .then(|| (change / prev.close * Decimal::ONE_HUNDRED).round_dp(2));
                    (Some(change), pct)
                }
                None => (None, None),
            };
            (
                Some(latest),
                change,
                pct,
                Some(w.latest.volume),
                Some(w.latest.date),
            )
        }
        None => (None, None, None, None, None),
    };

    EntityView {
        symbol: entity.symbol.clone(),
        name: entity.name.clone(),
        sector: entity.sector.clone(),
        industry: entity.industry.clone(),
        exchange: entity.exchange.clone(),
        market_cap: entity.market_cap,
        current_price,
        change,
        change_percent,
        volume,
        last_updated,
        has_sufficient_data: entity.has_sufficient_data,
    }
}

pub(crate) fn count_sectors(entities: &[TrackedEntity]) -> Vec<SectorCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for sector in entities
        .iter()
        .filter_map(|e| e.sector.as_deref())
        .filter(|s| !s.trim().is_empty())
    {
        *counts.entry(sector).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| SectorCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

pub(crate) fn paginate(mut views: Vec<EntityView>, limit: usize, offset: usize) -> EntityPage {
    views.sort_by_key(|v| (Reverse(v.market_cap), v.symbol.clone()));
    let total = views.len();
    let stocks: Vec<EntityView> = views.into_iter().skip(offset).take(limit).collect();
    EntityPage {
        has_more: offset.saturating_add(stocks.len()) < total,
        stocks,
        total,
        limit,
        offset,
    }
}

fn validate_price_range(min: Option<Decimal>, max: Option<Decimal>) -> Result<()> {
    if min.is_none() && max.is_none() {
        return Err(Error::Validation(
            "price range needs a minimum or a maximum".to_string(),
        ));
    }
    if [min, max].iter().flatten().any(|p| p.is_sign_negative()) {
        return Err(Error::Validation("price bounds must not be negative".to_string()));
    }
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(Error::Validation(format!(
                "price range minimum {} exceeds maximum {}",
                lo, hi
            )));
        }
    }
    Ok(())
}

pub(crate) fn filter_price_range(
    views: Vec<EntityView>,
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> Vec<EntityView> {
    let mut matched: Vec<EntityView> = views
        .into_iter()
        .filter(|v| {
            v.current_price.is_some_and(|p| {
                !min.is_some_and(|lo| p < lo) && !max.is_some_and(|hi| p > hi)
            })
        })
        .collect();
    matched.sort_by(|a, b| {
        a.current_price
            .cmp(&b.current_price)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    matched
}

pub(crate) fn rank_performance(views: &[EntityView], size: usize) -> PerformanceRankings {
    let mut priced: Vec<&EntityView> = views.iter().filter(|v| v.change_percent.is_some()).collect();

    priced.sort_by(|a, b| {
        b.change_percent
            .cmp(&a.change_percent)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    let gainers = priced.iter().take(size).map(|v| (*v).clone()).collect();

    priced.sort_by(|a, b| {
        a.change_percent
            .cmp(&b.change_percent)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    let losers = priced.iter().take(size).map(|v| (*v).clone()).collect();

    let mut active: Vec<&EntityView> = views.iter().filter(|v| v.volume.is_some()).collect();
    active.sort_by_key(|v| (Reverse(v.volume), v.symbol.clone()));
    let most_active = active.into_iter().take(size).cloned().collect();

    PerformanceRankings {
        gainers,
        losers,
        most_active,
    }
}

pub(crate) fn summarize(views: &[EntityView]) -> MarketOverview {
    let changes: Vec<Decimal> = views.iter().filter_map(|v| v.change_percent).collect();
    let advancing = changes.iter().filter(|c| c.is_sign_positive() && !c.is_zero()).count();
    let declining = changes.iter().filter(|c| c.is_sign_negative() && !c.is_zero()).count();
    let average_change_percent = if changes.is_empty() {
        Decimal::ZERO
    } else {
        (changes.iter().sum::<Decimal>() / Decimal::from(changes.len())).round_dp(2)
    };

    MarketOverview {
        total_entities: views.len(),
        advancing,
        declining,
        unchanged: changes.len() - advancing - declining,
        average_change_percent,
        last_updated: views.iter().filter_map(|v| v.last_updated).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyValueCache;
    use crate::market::PricePoint;
    use crate::test_support::{entity as new_entity, Harness};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn entity(symbol: &str) -> TrackedEntity {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TrackedEntity {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            sector: Some("Technology".to_string()),
            industry: None,
            exchange: Some("NASDAQ".to_string()),
            market_cap: None,
            is_active: true,
            has_sufficient_data: true,
            data_quality_score: 100,
            last_data_sync: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn window(symbol: &str, prev: Decimal, last: Decimal, volume: i64) -> PriceWindow {
        PriceWindow {
            symbol: symbol.to_string(),
            latest: PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                close: last,
                volume,
            },
            previous: Some(PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
                close: prev,
                volume,
            }),
        }
    }

    fn view(symbol: &str, prev: Decimal, last: Decimal, volume: i64) -> EntityView {
        build_view(&entity(symbol), Some(&window(symbol, prev, last, volume)))
    }

    #[test]
    fn test_build_view_computes_change() {
        let v = view("AAPL", dec!(200), dec!(210), 5);
        assert_eq!(v.current_price, Some(dec!(210)));
        assert_eq!(v.change, Some(dec!(10)));
        assert_eq!(v.change_percent, Some(dec!(5.00)));
        assert_eq!(v.volume, Some(5));
    }

    #[test]
    fn test_build_view_without_history() {
        let v = build_view(&entity("NEW"), None);
        assert!(v.current_price.is_none());
        assert!(v.change_percent.is_none());
    }

    #[test]
    fn test_single_point_has_price_but_no_change() {
        let mut w = window("ONE", dec!(1), dec!(2), 3);
        w.previous = None;
        let v = build_view(&entity("ONE"), Some(&w));
        assert_eq!(v.current_price, Some(dec!(2)));
        assert!(v.change.is_none());
    }

    #[test]
    fn test_rankings_order_and_size() {
        let views = vec![
            view("UP", dec!(100), dec!(110), 10),
            view("DOWN", dec!(100), dec!(90), 30),
            view("FLAT", dec!(100), dec!(100), 20),
        ];
        let ranks = rank_performance(&views, 2);
        let syms = |v: &Vec<EntityView>| v.iter().map(|e| e.symbol.clone()).collect::<Vec<_>>();
        assert_eq!(syms(&ranks.gainers), vec!["UP", "FLAT"]);
        assert_eq!(syms(&ranks.losers), vec!["DOWN", "FLAT"]);
        assert_eq!(syms(&ranks.most_active), vec!["DOWN", "FLAT"]);
    }

    #[test]
    fn test_overview_counts() {
        let views = vec![
            view("UP", dec!(100), dec!(110), 10),
            view("DOWN", dec!(100), dec!(94), 30),
            view("FLAT", dec!(100), dec!(100), 20),
            build_view(&entity("NONE"), None),
        ];
        let overview = summarize(&views);
        assert_eq!(overview.total_entities, 4);
        assert_eq!(overview.advancing, 1);
        assert_eq!(overview.declining, 1);
        assert_eq!(overview.unchanged, 1);
        assert_eq!(overview.average_change_percent, dec!(1.33));
        assert_eq!(overview.last_updated, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    // =========================================================================
    // Sectors, paging and price filters
    // =========================================================================

    fn harness() -> Harness {
        Harness::new(
            &[
                new_entity("AAA", "Technology", Some(300)),
                new_entity("BBB", "Technology", Some(900)),
                new_entity("CCC", "Energy", Some(500)),
                new_entity("DDD", "", None),
                new_entity("EEE", "Energy", Some(900)),
            ],
            0,
            25,
        )
    }

    #[tokio::test]
    async fn test_sectors_count_active_entities() {
        let h = harness();
        h.store.deactivate("CCC").await.unwrap();

        let sectors = h.views.sectors().await.unwrap();

        assert_eq!(
            sectors,
            vec![
                SectorCount { name: "Energy".to_string(), count: 1 },
                SectorCount { name: "Technology".to_string(), count: 2 },
            ]
        );
        assert!(h
            .cache
            .get(&CacheKey::sectors().to_string())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_page_orders_by_market_cap_and_reports_total() {
        let h = harness();

        let first = h.views.page(2, 0).await.unwrap();
        let syms: Vec<_> = first.stocks.iter().map(|v| v.symbol.as_str()).collect();
        assert_eq!(syms, vec!["BBB", "EEE"]);
        assert_eq!(first.total, 5);
        assert!(first.has_more);

        let last = h.views.page(2, 4).await.unwrap();
        assert_eq!(last.stocks.len(), 1);
        assert_eq!(last.stocks[0].symbol, "DDD");
        assert!(!last.has_more);

        let beyond = h.views.page(2, 10).await.unwrap();
        assert!(beyond.stocks.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[tokio::test]
    async fn test_page_limit_is_validated_and_capped() {
        let h = harness();
        assert!(matches!(h.views.page(0, 0).await, Err(Error::Validation(_))));

        let page = h.views.page(10_000, 0).await.unwrap();
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.stocks.len(), 5);
    }

    #[tokio::test]
    async fn test_price_range_keeps_priced_entities_within_bounds() {
        let h = harness();
        let last = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        // Latest close is 100 + count - 1.
        h.store.preload("AAA", 11, last);
        h.store.preload("BBB", 51, last);
        h.store.preload("CCC", 31, last);

        let mid = h.views.by_price_range(Some(dec!(110)), Some(dec!(130))).await.unwrap();
        let syms: Vec<_> = mid.iter().map(|v| v.symbol.as_str()).collect();
        assert_eq!(syms, vec!["AAA", "CCC"]);

        let upper = h.views.by_price_range(Some(dec!(140)), None).await.unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].symbol, "BBB");

        let lower = h.views.by_price_range(None, Some(dec!(109))).await.unwrap();
        assert!(lower.is_empty());
    }

    #[tokio::test]
    async fn test_price_range_rejects_bad_bounds() {
        let h = harness();
        for (min, max) in [
            (None, None),
            (Some(dec!(-1)), None),
            (Some(dec!(20)), Some(dec!(10))),
        ] {
            assert!(matches!(
                h.views.by_price_range(min, max).await,
                Err(Error::Validation(_))
            ));
        }
    }
}
