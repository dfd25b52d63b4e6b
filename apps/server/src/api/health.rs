use std::sync::Arc;

use crate::main_lib::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use stockpulse_core::{entities::EntityStore, quota::QuotaStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthLevel,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
    pub database: bool,
    pub provider_configured: bool,
    pub scheduler_running: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub quota: Option<QuotaStatus>,
    pub subscribers: usize,
    pub max_subscribers: usize,
}

/// Database unreachable is unhealthy. A closed quota gate, an unreadable
/// ledger or a missing provider key is degraded.
fn classify(database: bool, quota: Option<&QuotaStatus>, provider_configured: bool) -> HealthLevel {
    if !database {
        return HealthLevel::Unhealthy;
    }
    match quota {
        Some(q) if q.can_proceed && provider_configured => HealthLevel::Healthy,
        _ => HealthLevel::Degraded,
    }
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let database = match state.entity_store.list_active() {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("Health check could not read entities: {}", e);
            false
        }
    };
    let quota = match state.ledger.current().await {
        Ok(q) => Some(q),
        Err(e) => {
            tracing::warn!("Health check could not read quota: {}", e);
            None
        }
    };
    let scheduler = state.sync_service.status();
    let status = classify(database, quota.as_ref(), state.provider_configured);
    let now = state.clock.now();

    let report = HealthReport {
        status,
        timestamp: now,
        uptime_secs: (now - state.started_at).num_seconds(),
        database,
        provider_configured: state.provider_configured,
        scheduler_running: scheduler.is_running,
        last_sync: scheduler.last_sync,
        quota,
        subscribers: state.hub.subscriber_count(),
        max_subscribers: state.hub.config().max_subscribers,
    };
    let code = if status == HealthLevel::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
