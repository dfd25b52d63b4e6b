use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use diesel::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use stockpulse_core::calls::{CallLogStore, CallRecord};
use stockpulse_core::entities::{EntityStore, NewEntity};
use stockpulse_core::history::HistoryStore;
use stockpulse_core::market::MarketViewStore;
use stockpulse_core::quota::{QuotaState, QuotaStore};
use stockpulse_market_data::DailyBar;
use stockpulse_storage_sqlite::db::spawn_writer;
use stockpulse_storage_sqlite::schema::api_quota::dsl as quota_dsl;
use stockpulse_storage_sqlite::utils::parse_timestamp;
use stockpulse_storage_sqlite::{
    create_pool, get_connection, init, run_migrations, CallLogRepository, DbPool,
    EntityRepository, HistoryRepository, QuotaRepository,
};

struct TestDb {
    pool: Arc<DbPool>,
    quota: QuotaRepository,
    calls: CallLogRepository,
    entities: EntityRepository,
    history: HistoryRepository,
    _dir: TempDir,
}

async fn setup() -> TestDb {
    let dir = tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("nested").join("test.db");
    let db_path = init(&db_path.to_string_lossy()).expect("Failed to init database");
    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    TestDb {
        pool: Arc::clone(&pool),
        quota: QuotaRepository::new(Arc::clone(&pool), writer.clone()),
        calls: CallLogRepository::new(Arc::clone(&pool), writer.clone()),
        entities: EntityRepository::new(Arc::clone(&pool), writer.clone()),
        history: HistoryRepository::new(Arc::clone(&pool), writer),
        _dir: dir,
    }
}

fn new_entity(symbol: &str, sector: &str, market_cap: i64) -> NewEntity {
    NewEntity {
        symbol: symbol.to_string(),
        name: format!("{} Corp", symbol),
        sector: Some(sector.to_string()),
        industry: None,
        exchange: Some("NYSE".to_string()),
        market_cap: Some(market_cap),
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn bar(d: u32, close: rust_decimal::Decimal) -> DailyBar {
    DailyBar {
        date: day(d),
        open: close - dec!(1),
        high: close + dec!(2),
        low: close - dec!(2),
        close,
        adjusted_close: close,
        volume: 1_000 + d as i64,
    }
}

// ==================== Quota ====================

#[tokio::test]
async fn test_quota_ensure_is_insert_once() {
    let db = setup().await;
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap();
    let initial = QuotaState::new("alpha_vantage", 25, None, now);

    let first = db.quota.ensure(&initial, now).await.unwrap();
    assert_eq!(first, initial);

    let mut used = first.clone();
    used.daily_used = 7;
    assert!(db.quota.compare_and_swap(&first, &used, now).await.unwrap());

    let reconfigured = QuotaState::new("alpha_vantage", 50, Some(5), now);
    let stored = db.quota.ensure(&reconfigured, now).await.unwrap();
    assert_eq!(stored.daily_used, 7);
    assert_eq!(stored.daily_limit, 50);
    assert_eq!(stored.hourly_limit, Some(5));
}

#[tokio::test]
async fn test_quota_swap_rejects_stale_expectation() {
    let db = setup().await;
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap();
    let base = db
        .quota
        .ensure(&QuotaState::new("alpha_vantage", 25, None, now), now)
        .await
        .unwrap();

    let a = base.consumed();
    let b = base.consumed();
    assert!(db.quota.compare_and_swap(&base, &a, now).await.unwrap());
    assert!(!db.quota.compare_and_swap(&base, &b, now).await.unwrap());

    let stored = db.quota.load("alpha_vantage").await.unwrap().unwrap();
    assert_eq!(stored.daily_used, 1);
    assert!(db.quota.load("other").await.unwrap().is_none());
}

fn quota_updated_at(db: &TestDb, service: &str) -> DateTime<Utc> {
    let mut conn = get_connection(&db.pool).unwrap();
    let raw: String = quota_dsl::api_quota
        .find(service)
        .select(quota_dsl::updated_at)
        .first(&mut conn)
        .unwrap();
    parse_timestamp(&raw).unwrap()
}

#[tokio::test]
async fn test_quota_writes_stamp_the_caller_time() {
    let db = setup().await;
    let created = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
    let base = db
        .quota
        .ensure(&QuotaState::new("alpha_vantage", 25, None, created), created)
        .await
        .unwrap();
    assert_eq!(quota_updated_at(&db, "alpha_vantage"), created);

    let later = created + Duration::minutes(90);
    assert!(db
        .quota
        .compare_and_swap(&base, &base.consumed(), later)
        .await
        .unwrap());
    assert_eq!(quota_updated_at(&db, "alpha_vantage"), later);

    // A lost swap leaves the stamp alone.
    assert!(!db
        .quota
        .compare_and_swap(&base, &base.consumed(), later + Duration::hours(1))
        .await
        .unwrap());
    assert_eq!(quota_updated_at(&db, "alpha_vantage"), later);
}

// ==================== Entities ====================

#[tokio::test]
async fn test_seed_is_idempotent_and_deactivate_hides() {
    let db = setup().await;
    let seeds = vec![
        new_entity("MSFT", "Technology", 3_000),
        new_entity("xom", "Energy", 450),
    ];

    assert_eq!(db.entities.seed(&seeds).await.unwrap(), 2);
    assert_eq!(db.entities.seed(&seeds).await.unwrap(), 0);
    assert!(db.entities.get("XOM").unwrap().is_some());

    assert!(db.entities.deactivate("XOM").await.unwrap());
    assert!(!db.entities.deactivate("NOPE").await.unwrap());

    let active = db.entities.list_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].symbol, "MSFT");
    assert!(!db.entities.get("XOM").unwrap().unwrap().is_active);
}

// ==================== History ====================

#[tokio::test]
async fn test_save_series_upserts_and_updates_completeness() {
    let db = setup().await;
    db.entities
        .seed(&[new_entity("MSFT", "Technology", 3_000)])
        .await
        .unwrap();
    let synced_at = Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0).unwrap();

    let first = db
        .history
        .save_series("MSFT", &[bar(11, dec!(400)), bar(12, dec!(402.5))], 3, synced_at)
        .await
        .unwrap();
    assert_eq!((first.inserted, first.updated), (2, 0));
    assert_eq!(first.history_count, 2);
    assert!(!first.has_sufficient_data);

    let second = db
        .history
        .save_series("MSFT", &[bar(12, dec!(405)), bar(13, dec!(410.25))], 3, synced_at)
        .await
        .unwrap();
    assert_eq!((second.inserted, second.updated), (1, 1));
    assert_eq!(second.history_count, 3);
    assert!(second.has_sufficient_data);

    let recent = db.history.recent("MSFT", 2).unwrap();
    assert_eq!(recent[0].date, day(13));
    assert_eq!(recent[1].close, dec!(405));
    assert_eq!(db.history.count("MSFT").unwrap(), 3);

    let entity = db.entities.get("MSFT").unwrap().unwrap();
    assert!(entity.has_sufficient_data);
    assert_eq!(entity.data_quality_score, 3);
    assert_eq!(entity.last_data_sync, Some(synced_at));

    let stats = db.entities.list_active_stats().unwrap();
    assert_eq!(stats[0].history_count, 3);
    assert_eq!(stats[0].latest_date, Some(day(13)));
}

#[tokio::test]
async fn test_save_series_for_unknown_entity_writes_nothing() {
    let db = setup().await;

    let result = db
        .history
        .save_series("GHOST", &[bar(11, dec!(1))], 30, Utc::now())
        .await;

    assert!(result.is_err());
    assert_eq!(db.history.count("GHOST").unwrap(), 0);
}

#[tokio::test]
async fn test_price_windows_take_latest_two() {
    let db = setup().await;
    db.entities
        .seed(&[
            new_entity("AAA", "Technology", 10),
            new_entity("BBB", "Energy", 5),
            new_entity("CCC", "Energy", 1),
        ])
        .await
        .unwrap();
    db.history
        .save_series(
            "AAA",
            &[bar(11, dec!(10)), bar(12, dec!(11)), bar(13, dec!(12))],
            30,
            Utc::now(),
        )
        .await
        .unwrap();
    db.history
        .save_series("BBB", &[bar(13, dec!(50))], 30, Utc::now())
        .await
        .unwrap();

    let windows = db.entities.price_windows().unwrap();

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].symbol, "AAA");
    assert_eq!(windows[0].latest.close, dec!(12));
    assert_eq!(windows[0].previous.as_ref().unwrap().close, dec!(11));
    assert!(windows[1].previous.is_none());
    assert!(db.entities.price_window("CCC").unwrap().is_none());
    assert_eq!(
        db.entities.price_window("aaa").unwrap().unwrap().latest.date,
        day(13)
    );
}

// ==================== Call log ====================

fn record(endpoint: &str, error: Option<&str>, latency_ms: i64, age_days: i64) -> CallRecord {
    CallRecord {
        id: uuid::Uuid::now_v7().to_string(),
        service: "alpha_vantage".to_string(),
        endpoint: endpoint.to_string(),
        params: r#"{"symbol":"MSFT"}"#.to_string(),
        http_status: Some(200),
        response_snippet: Some("{}".to_string()),
        error: error.map(str::to_string),
        latency_ms,
        created_at: Utc::now() - Duration::days(age_days),
    }
}

#[tokio::test]
async fn test_call_log_stats_and_retention() {
    let db = setup().await;
    db.calls
        .append(&record("TIME_SERIES_DAILY", None, 100, 0))
        .await
        .unwrap();
    db.calls
        .append(&record("TIME_SERIES_DAILY", Some("rate limited"), 300, 0))
        .await
        .unwrap();
    db.calls
        .append(&record("TIME_SERIES_DAILY", None, 50, 40))
        .await
        .unwrap();

    let stats = db
        .calls
        .daily_stats(Utc::now() - Duration::days(1))
        .unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total, 2);
    assert_eq!(stats[0].successful, 1);
    assert_eq!(stats[0].failed, 1);
    assert_eq!(stats[0].avg_latency_ms, 200.0);

    let removed = db
        .calls
        .purge_older_than(Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let recent = db.calls.recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].created_at >= recent[1].created_at);
}
