use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use chrono::{DateTime, Utc};
use stockpulse_core::{
    cache::{KeyValueCache, MemoryCache, NoopCache, ReadThroughCache},
    calls::{CallLogStore, ProviderClient},
    clock::{Clock, SystemClock},
    constants::{ALPHA_VANTAGE_SERVICE, CACHE_TTL_SECS},
    entities::{default_seeds, EntityStore},
    fanout::{FanoutHub, HubConfig},
    history::HistoryWriter,
    market::MarketViewService,
    quota::{QuotaConfig, QuotaLedger},
    sync::{SyncConfig, SyncService},
};
use stockpulse_market_data::{AlphaVantageProvider, DailySeriesProvider};
use stockpulse_storage_sqlite::{
    db::{self, write_actor},
    CallLogRepository, EntityRepository, HistoryRepository, QuotaRepository,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub ledger: Arc<QuotaLedger>,
    pub sync_service: Arc<SyncService>,
    pub market_service: Arc<MarketViewService>,
    pub hub: Arc<FanoutHub>,
    pub entity_store: Arc<dyn EntityStore>,
    pub call_log: Arc<dyn CallLogStore>,
    pub clock: Arc<dyn Clock>,
    /// False when no provider key is configured. Sync endpoints refuse and
    /// the scheduler is not started.
    pub provider_configured: bool,
    pub sync_interval: Duration,
    pub call_log_retention_days: i64,
    pub started_at: DateTime<Utc>,
    /// Cancelled on process shutdown. Live subscriber sessions watch it.
    pub shutdown: CancellationToken,
}

pub fn init_tracing() {
    let log_format = std::env::var("SP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let quota_repository = Arc::new(QuotaRepository::new(pool.clone(), writer.clone()));
    let call_log_repository = Arc::new(CallLogRepository::new(pool.clone(), writer.clone()));
    let entity_repository = Arc::new(EntityRepository::new(pool.clone(), writer.clone()));
    let history_repository = Arc::new(HistoryRepository::new(pool.clone(), writer.clone()));

    let seeded = entity_repository.seed(&default_seeds()).await?;
    if seeded > 0 {
        tracing::info!("Seeded {} tracked entities", seeded);
    }

    let ledger = Arc::new(QuotaLedger::new(
        quota_repository,
        clock.clone(),
        QuotaConfig {
            service: ALPHA_VANTAGE_SERVICE.to_string(),
            daily_limit: config.daily_limit,
            hourly_limit: config.hourly_limit,
        },
    ));
    let quota = ledger.initialize().await?;
    tracing::info!(
        "Quota for {}: {}/{} used on {}",
        quota.service,
        quota.daily_used,
        quota.daily_limit,
        quota.last_reset_date
    );

    let kv: Arc<dyn KeyValueCache> = if config.cache_enabled {
        Arc::new(MemoryCache::new())
    } else {
        tracing::info!("Cache disabled; every read goes to the database");
        Arc::new(NoopCache)
    };
    let read_cache = ReadThroughCache::new(kv, Duration::from_secs(CACHE_TTL_SECS));
    let invalidator = Arc::new(read_cache.invalidator());

    let provider_configured = config.api_key.is_some();
    if !provider_configured {
        tracing::warn!("ALPHA_VANTAGE_API_KEY not set; history sync is disabled");
    }
    let provider: Arc<dyn DailySeriesProvider> = Arc::new(AlphaVantageProvider::new(
        config.api_key.clone().unwrap_or_default(),
    ));

    let sync_config = SyncConfig {
        batch_pacing: config.batch_pacing,
        ..SyncConfig::default()
    };
    let client = ProviderClient::new(
        provider,
        ledger.clone(),
        call_log_repository.clone(),
        clock.clone(),
    );
    let history_writer = HistoryWriter::new(
        history_repository,
        invalidator,
        clock.clone(),
        sync_config.min_history_points,
    );
    let sync_service = Arc::new(SyncService::new(
        entity_repository.clone(),
        ledger.clone(),
        client,
        history_writer,
        clock.clone(),
        sync_config,
    ));

    let market_service = Arc::new(MarketViewService::new(
        entity_repository.clone(),
        entity_repository.clone(),
        read_cache,
    ));

    let hub = FanoutHub::new(
        HubConfig {
            max_subscribers: config.max_subscribers,
            broadcast_interval: config.broadcast_interval,
            ..HubConfig::default()
        },
        market_service.clone(),
        clock.clone(),
    );

    Ok(Arc::new(AppState {
        ledger,
        sync_service,
        market_service,
        hub,
        entity_store: entity_repository,
        call_log: call_log_repository,
        clock: clock.clone(),
        provider_configured,
        sync_interval: config.sync_interval,
        call_log_retention_days: config.call_log_retention_days,
        started_at: clock.now(),
        shutdown: CancellationToken::new(),
    }))
}
