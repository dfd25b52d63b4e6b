use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{extract::State, routing::get, Json, Router};
use stockpulse_core::market::{MarketOverview, PerformanceRankings};

async fn performance(State(state): State<Arc<AppState>>) -> ApiResult<Json<PerformanceRankings>> {
    let rankings = state.market_service.performance().await?;
    Ok(Json(rankings))
}

async fn overview(State(state): State<Arc<AppState>>) -> ApiResult<Json<MarketOverview>> {
    let overview = state.market_service.overview().await?;
    Ok(Json(overview))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market/performance", get(performance))
        .route("/market/overview", get(overview))
}
