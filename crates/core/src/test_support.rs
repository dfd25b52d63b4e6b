//! In-memory stores and a scripted provider shared by the service tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stockpulse_market_data::{
    DailyBar, DailySeries, DailySeriesProvider, MarketDataError, ProviderCall,
};

use crate::cache::{MemoryCache, ReadThroughCache};
use crate::calls::{CallLogStore, CallRecord, CallStats, ProviderClient};
use crate::clock::{Clock, ManualClock};
use crate::entities::{EntityStats, EntityStore, NewEntity, TrackedEntity};
use crate::errors::{DatabaseError, Error, Result};
use crate::history::{Completeness, HistoryPoint, HistoryStore, HistoryWriter, WriteOutcome};
use crate::market::{MarketViewService, MarketViewStore, PricePoint, PriceWindow};
use crate::quota::{QuotaConfig, QuotaLedger, QuotaState, QuotaStore};
use crate::sync::{SyncConfig, SyncService};

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn offline() -> Error {
    Error::Database(DatabaseError::ConnectionFailed("store offline".to_string()))
}

// =============================================================================
// Quota
// =============================================================================

#[derive(Default)]
pub struct InMemoryQuotaStore {
    rows: Mutex<HashMap<String, QuotaState>>,
    pub fail: AtomicBool,
    pub swaps: AtomicUsize,
    stamped: Mutex<Option<DateTime<Utc>>>,
}

impl InMemoryQuotaStore {
    pub fn with_row(state: QuotaState) -> Self {
        let store = Self::default();
        store.put(state);
        store
    }

    pub fn put(&self, state: QuotaState) {
        self.rows
            .lock()
            .unwrap()
            .insert(state.service.clone(), state);
    }

    pub fn row(&self, service: &str) -> Option<QuotaState> {
        self.rows.lock().unwrap().get(service).cloned()
    }

    /// Update time of the last successful write.
    pub fn stamped(&self) -> Option<DateTime<Utc>> {
        *self.stamped.lock().unwrap()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn load(&self, service: &str) -> Result<Option<QuotaState>> {
        self.check()?;
        Ok(self.row(service))
    }

    async fn ensure(&self, initial: &QuotaState, now: DateTime<Utc>) -> Result<QuotaState> {
        self.check()?;
        *self.stamped.lock().unwrap() = Some(now);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry(initial.service.clone())
            .or_insert_with(|| initial.clone());
        row.daily_limit = initial.daily_limit;
        row.hourly_limit = initial.hourly_limit;
        Ok(row.clone())
    }

    async fn compare_and_swap(
        &self,
        expected: &QuotaState,
        next: &QuotaState,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.check()?;
        // Yield so concurrent acquirers interleave between read and swap.
        tokio::task::yield_now().await;
        self.swaps.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&expected.service) {
            Some(row)
                if row.daily_used == expected.daily_used
                    && row.hourly_used == expected.hourly_used
                    && row.last_reset_date == expected.last_reset_date
                    && row.last_reset_hour == expected.last_reset_hour =>
            {
                *row = next.clone();
                *self.stamped.lock().unwrap() = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// =============================================================================
// Entities, history and price windows
// =============================================================================

#[derive(Default)]
pub struct InMemoryStore {
    entities: Mutex<BTreeMap<String, TrackedEntity>>,
    history: Mutex<BTreeMap<(String, NaiveDate), HistoryPoint>>,
    pub fail_writes: AtomicBool,
}

pub fn entity(symbol: &str, sector: &str, market_cap: Option<i64>) -> NewEntity {
    NewEntity {
        symbol: symbol.to_string(),
        name: format!("{} Inc.", symbol),
        sector: Some(sector.to_string()),
        industry: None,
        exchange: Some("NASDAQ".to_string()),
        market_cap,
    }
}

impl InMemoryStore {
    pub fn seeded(entities: &[NewEntity]) -> Self {
        let store = Self::default();
        {
            let mut map = store.entities.lock().unwrap();
            for e in entities {
                map.insert(e.symbol.clone(), tracked(e));
            }
        }
        store
    }

    /// Stores `count` consecutive closes for `symbol` ending at `last`.
    pub fn preload(&self, symbol: &str, count: i64, last: NaiveDate) {
        let bars: Vec<DailyBar> = (0..count)
            .map(|i| bar(last - ChronoDuration::days(count - 1 - i), Decimal::from(100 + i)))
            .collect();
        self.upsert(symbol, &bars, 30, Utc::now());
    }

    pub fn entity(&self, symbol: &str) -> TrackedEntity {
        self.entities.lock().unwrap()[symbol].clone()
    }

    pub fn stored_points(&self, symbol: &str) -> i64 {
        self.history
            .lock()
            .unwrap()
            .keys()
            .filter(|(s, _)| s == symbol)
            .count() as i64
    }

    fn upsert(
        &self,
        symbol: &str,
        bars: &[DailyBar],
        min_points: i64,
        synced_at: DateTime<Utc>,
    ) -> WriteOutcome {
        let mut history = self.history.lock().unwrap();
        let mut outcome = WriteOutcome::default();
        for b in bars {
            let key = (symbol.to_string(), b.date);
            let created_at = match history.get(&key) {
                Some(existing) => {
                    outcome.updated += 1;
                    existing.created_at
                }
                None => {
                    outcome.inserted += 1;
                    synced_at
                }
            };
            history.insert(
                key,
                HistoryPoint {
                    symbol: symbol.to_string(),
                    date: b.date,
                    open: b.open,
                    high: b.high,
                    low: b.low,
                    close: b.close,
                    adjusted_close: b.adjusted_close,
                    volume: b.volume,
                    created_at,
                    updated_at: synced_at,
                },
            );
        }
        let count = history.keys().filter(|(s, _)| s == symbol).count() as i64;
        drop(history);

        let completeness = Completeness::evaluate(count, min_points);
        if let Some(e) = self.entities.lock().unwrap().get_mut(symbol) {
            e.has_sufficient_data = completeness.has_sufficient_data;
            e.data_quality_score = completeness.data_quality_score;
            e.last_data_sync = Some(synced_at);
            e.updated_at = synced_at;
        }
        outcome.history_count = count;
        outcome.has_sufficient_data = completeness.has_sufficient_data;
        outcome
    }

    fn points(&self, symbol: &str) -> Vec<HistoryPoint> {
        self.history
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect()
    }

    fn window(&self, symbol: &str) -> Option<PriceWindow> {
        let mut points = self.points(symbol);
        points.sort_by(|a, b| b.date.cmp(&a.date));
        let to_point = |p: &HistoryPoint| PricePoint {
            date: p.date,
            close: p.close,
            volume: p.volume,
        };
        let latest = points.first().map(to_point)?;
        Some(PriceWindow {
            symbol: symbol.to_string(),
            latest,
            previous: points.get(1).map(to_point),
        })
    }
}

fn tracked(e: &NewEntity) -> TrackedEntity {
    let now = Utc::now();
    TrackedEntity {
        symbol: e.symbol.clone(),
        name: e.name.clone(),
        sector: e.sector.clone(),
        industry: e.industry.clone(),
        exchange: e.exchange.clone(),
        market_cap: e.market_cap,
        is_active: true,
        has_sufficient_data: false,
        data_quality_score: 0,
        last_data_sync: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn bar(date: NaiveDate, close: Decimal) -> DailyBar {
    DailyBar::unadjusted(date, close, close, close, close, 1_000)
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn seed(&self, entities: &[NewEntity]) -> Result<usize> {
        let mut map = self.entities.lock().unwrap();
        let mut inserted = 0;
        for e in entities {
            if !map.contains_key(&e.symbol) {
                map.insert(e.symbol.clone(), tracked(e));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn deactivate(&self, symbol: &str) -> Result<bool> {
        match self.entities.lock().unwrap().get_mut(symbol) {
            Some(e) => {
                e.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, symbol: &str) -> Result<Option<TrackedEntity>> {
        Ok(self.entities.lock().unwrap().get(symbol).cloned())
    }

    fn list_active(&self) -> Result<Vec<TrackedEntity>> {
        Ok(self
            .entities
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.is_active)
            .cloned()
            .collect())
    }

    fn list_active_stats(&self) -> Result<Vec<EntityStats>> {
        let active = self.list_active()?;
        Ok(active
            .into_iter()
            .map(|entity| {
                let points = self.points(&entity.symbol);
                EntityStats {
                    history_count: points.len() as i64,
                    latest_date: points.iter().map(|p| p.date).max(),
                    entity,
                }
            })
            .collect())
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn save_series(
        &self,
        symbol: &str,
        bars: &[DailyBar],
        min_points: i64,
        synced_at: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "disk full".to_string(),
            )));
        }
        Ok(self.upsert(symbol, bars, min_points, synced_at))
    }

    fn count(&self, symbol: &str) -> Result<i64> {
        Ok(self.stored_points(symbol))
    }

    fn recent(&self, symbol: &str, limit: i64) -> Result<Vec<HistoryPoint>> {
        let mut points = self.points(symbol);
        points.sort_by(|a, b| b.date.cmp(&a.date));
        points.truncate(limit.max(0) as usize);
        Ok(points)
    }
}

impl MarketViewStore for InMemoryStore {
    fn price_windows(&self) -> Result<Vec<PriceWindow>> {
        Ok(self
            .list_active()?
            .iter()
            .filter_map(|e| self.window(&e.symbol))
            .collect())
    }

    fn price_window(&self, symbol: &str) -> Result<Option<PriceWindow>> {
        Ok(self.window(symbol))
    }
}

// =============================================================================
// Call log
// =============================================================================

#[derive(Default)]
pub struct InMemoryCallLog {
    records: Mutex<Vec<CallRecord>>,
    pub fail: AtomicBool,
}

impl InMemoryCallLog {
    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn push(&self, record: CallRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl CallLogStore for InMemoryCallLog {
    async fn append(&self, record: &CallRecord) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.push(record.clone());
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok(before - records.len())
    }

    fn recent(&self, limit: i64) -> Result<Vec<CallRecord>> {
        let mut records = self.records();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    fn daily_stats(&self, since: DateTime<Utc>) -> Result<Vec<CallStats>> {
        let mut groups: BTreeMap<(NaiveDate, String), Vec<CallRecord>> = BTreeMap::new();
        for r in self.records().into_iter().filter(|r| r.created_at >= since) {
            groups
                .entry((r.created_at.date_naive(), r.endpoint.clone()))
                .or_default()
                .push(r);
        }
        Ok(groups
            .into_iter()
            .map(|((day, endpoint), rs)| {
                let successful = rs.iter().filter(|r| r.is_success()).count() as i64;
                CallStats {
                    day,
                    endpoint,
                    total: rs.len() as i64,
                    successful,
                    failed: rs.len() as i64 - successful,
                    avg_latency_ms: rs.iter().map(|r| r.latency_ms as f64).sum::<f64>()
                        / rs.len() as f64,
                }
            })
            .collect())
    }
}

// =============================================================================
// Provider
// =============================================================================

/// Answers with `default_points` bars unless a response was scripted for
/// the symbol.
pub struct FakeProvider {
    scripted: Mutex<HashMap<String, VecDeque<std::result::Result<usize, MarketDataError>>>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    default_points: usize,
    last_date: NaiveDate,
}

impl FakeProvider {
    pub fn new(default_points: usize, last_date: NaiveDate) -> Self {
        Self {
            scripted: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            default_points,
            last_date,
        }
    }

    pub fn script(&self, symbol: &str, response: std::result::Result<usize, MarketDataError>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every later call takes `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    fn series(&self, symbol: &str, points: usize) -> DailySeries {
        let bars = (0..points as i64)
            .map(|i| {
                bar(
                    self.last_date - ChronoDuration::days(points as i64 - 1 - i),
                    Decimal::from(50 + i),
                )
            })
            .collect();
        DailySeries::new(symbol, bars)
    }
}

#[async_trait]
impl DailySeriesProvider for FakeProvider {
    fn id(&self) -> &'static str {
        "FAKE"
    }

    async fn fetch_daily(&self, symbol: &str) -> ProviderCall {
        self.calls.lock().unwrap().push(symbol.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(|q| q.pop_front());
        let result = match scripted.unwrap_or(Ok(self.default_points)) {
            Ok(points) => Ok(self.series(symbol, points)),
            Err(e) => Err(e),
        };
        ProviderCall {
            provider: "FAKE",
            endpoint: "TIME_SERIES_DAILY".to_string(),
            params: vec![("symbol".to_string(), symbol.to_string())],
            http_status: Some(200),
            body: Some("{}".to_string()),
            latency: Duration::from_millis(12),
            result,
        }
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// A fully wired sync stack over in-memory parts.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub quota: Arc<InMemoryQuotaStore>,
    pub ledger: Arc<QuotaLedger>,
    pub store: Arc<InMemoryStore>,
    pub calls: Arc<InMemoryCallLog>,
    pub provider: Arc<FakeProvider>,
    pub cache: Arc<MemoryCache>,
    pub service: SyncService,
    pub views: MarketViewService,
}

impl Harness {
    pub fn new(entities: &[NewEntity], daily_used: i32, daily_limit: i32) -> Self {
        Self::with_config(entities, daily_used, daily_limit, SyncConfig {
            batch_pacing: Duration::ZERO,
            ..SyncConfig::default()
        })
    }

    pub fn with_config(
        entities: &[NewEntity],
        daily_used: i32,
        daily_limit: i32,
        config: SyncConfig,
    ) -> Self {
        let now = at(2024, 3, 14, 15, 30);
        let clock = Arc::new(ManualClock::new(now));
        let quota_config = QuotaConfig {
            daily_limit,
            ..QuotaConfig::default()
        };
        let mut row = QuotaState::new(quota_config.service.clone(), daily_limit, None, now);
        row.daily_used = daily_used;
        let quota = Arc::new(InMemoryQuotaStore::with_row(row));
        let ledger = Arc::new(QuotaLedger::new(quota.clone(), clock.clone(), quota_config));

        let store = Arc::new(InMemoryStore::seeded(entities));
        let calls = Arc::new(InMemoryCallLog::default());
        let provider = Arc::new(FakeProvider::new(40, now.date_naive()));
        let cache = Arc::new(MemoryCache::new());
        let reader = ReadThroughCache::new(cache.clone(), Duration::from_secs(60));

        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let client = ProviderClient::new(
            provider.clone(),
            ledger.clone(),
            calls.clone(),
            clock_dyn.clone(),
        );
        let writer = HistoryWriter::new(
            store.clone(),
            Arc::new(reader.invalidator()),
            clock_dyn.clone(),
            config.min_history_points,
        );
        let views = MarketViewService::new(store.clone(), store.clone(), reader);
        let service = SyncService::new(
            store.clone(),
            ledger.clone(),
            client,
            writer,
            clock_dyn,
            config,
        );

        Self {
            clock,
            quota,
            ledger,
            store,
            calls,
            provider,
            cache,
            service,
            views,
        }
    }

    pub fn used(&self) -> i32 {
        self.quota
            .row(self.ledger.service())
            .map(|r| r.daily_used)
            .unwrap_or_default()
    }
}
