use std::future::Future;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use stockpulse_core::{
    constants::{DEFAULT_PENDING_LIMIT, MAX_BATCH_SIZE},
    priority::EntityPriority,
    sync::{BatchResult, CoverageStatus, SchedulerStatus, SyncReport},
};

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

/// Rejects non-positive limits and clamps to `max`.
pub(crate) fn resolve_limit(requested: Option<i64>, default: usize, max: usize) -> ApiResult<usize> {
    match requested {
        None => Ok(default.min(max)),
        Some(n) if n <= 0 => Err(ApiError::BadRequest(format!(
            "limit must be positive, got {}",
            n
        ))),
        Some(n) => Ok(usize::try_from(n).unwrap_or(max).min(max)),
    }
}

fn require_provider(state: &AppState) -> ApiResult<()> {
    if state.provider_configured {
        Ok(())
    } else {
        Err(ApiError::ServiceUnavailable(
            "History sync is disabled: no provider API key configured".to_string(),
        ))
    }
}

/// Runs a manual sync on its own task. A client that disconnects stops
/// waiting but does not cut the sync short.
async fn run_detached<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: Future<Output = stockpulse_core::Result<T>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => Ok(result?),
        Err(e) => Err(ApiError::Anyhow(anyhow::Error::new(e))),
    }
}

async fn sync_single(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<SyncReport>> {
    require_provider(&state)?;
    let service = state.sync_service.clone();
    let report = run_detached(async move { service.trigger_single(&symbol).await }).await?;
    Ok(Json(report))
}

async fn sync_batch(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<BatchResult>> {
    require_provider(&state)?;
    let config = state.sync_service.config();
    let limit = resolve_limit(query.limit, config.default_batch_size, MAX_BATCH_SIZE)?;
    let service = state.sync_service.clone();
    let cancel = state.shutdown.child_token();
    let result = run_detached(async move { service.trigger_batch(limit, &cancel).await }).await?;
    Ok(Json(result))
}

async fn pending(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<EntityPriority>>> {
    let limit = resolve_limit(query.limit, DEFAULT_PENDING_LIMIT, usize::MAX)?;
    let pending = state.sync_service.pending_entities(limit)?;
    Ok(Json(pending))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    Json(state.sync_service.status())
}

async fn coverage(State(state): State<Arc<AppState>>) -> ApiResult<Json<CoverageStatus>> {
    let coverage = state.sync_service.coverage().await?;
    Ok(Json(coverage))
}

/// Manual sync triggers, mounted without the request timeout.
pub fn trigger_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/stocks/{symbol}", post(sync_single))
        .route("/sync/batch", post(sync_batch))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/pending", get(pending))
        .route("/sync/status", get(status))
        .route("/sync/coverage", get(coverage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit_defaults_and_clamps() {
        assert_eq!(resolve_limit(None, 24, 25).unwrap(), 24);
        assert_eq!(resolve_limit(Some(10), 24, 25).unwrap(), 10);
        assert_eq!(resolve_limit(Some(400), 24, 25).unwrap(), 25);
        assert_eq!(resolve_limit(None, 25, usize::MAX).unwrap(), 25);
    }

    #[test]
    fn test_resolve_limit_rejects_non_positive() {
        assert!(matches!(
            resolve_limit(Some(0), 24, 25),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            resolve_limit(Some(-3), 24, 25),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_detached_work_outlives_a_dropped_caller() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let work = async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let _ = done_tx.send("synced");
            stockpulse_core::Result::Ok(())
        };

        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(5), run_detached(work)).await;

        assert!(waited.is_err());
        assert_eq!(done_rx.await.unwrap(), "synced");
    }
}
