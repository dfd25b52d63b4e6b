use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Duration;
use serde::Deserialize;
use stockpulse_core::calls::{CallLogStore, CallRecord, CallStats};

const DEFAULT_STATS_DAYS: i64 = 7;
const DEFAULT_RECENT_LIMIT: i64 = 50;

#[derive(Deserialize)]
struct StatsQuery {
    days: Option<i64>,
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Vec<CallStats>>> {
    let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
    if !(1..=state.call_log_retention_days.max(1)).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}",
            state.call_log_retention_days.max(1)
        )));
    }
    let since = state.clock.now() - Duration::days(days);
    let stats = state.call_log.daily_stats(since)?;
    Ok(Json(stats))
}

async fn recent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<CallRecord>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, 500);
    let records = state.call_log.recent(limit)?;
    Ok(Json(records))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calls/stats", get(stats))
        .route("/calls/recent", get(recent))
}
