use std::str::FromStr;
use std::sync::Arc;

use super::sync::resolve_limit;
use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use stockpulse_core::{
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    market::{EntityPage, EntityView, SectorCount},
};

#[derive(Deserialize)]
struct PageQuery {
    limit: Option<i64>,
    offset: Option<usize>,
}

#[derive(Deserialize)]
struct PriceRangeQuery {
    min: Option<String>,
    max: Option<String>,
}

fn parse_price(name: &str, raw: Option<&str>) -> ApiResult<Option<Decimal>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Decimal::from_str(s)
                .map_err(|_| ApiError::BadRequest(format!("{} must be a number, got {}", name, s)))
        })
        .transpose()
}

async fn list_stocks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<EntityView>>> {
    let views = state.market_service.list().await?;
    Ok(Json(views))
}

async fn list_sectors(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SectorCount>>> {
    let sectors = state.market_service.sectors().await?;
    Ok(Json(sectors))
}

async fn stocks_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<EntityPage>> {
    let limit = resolve_limit(query.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)?;
    let page = state
        .market_service
        .page(limit, query.offset.unwrap_or_default())
        .await?;
    Ok(Json(page))
}

async fn stocks_by_price_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PriceRangeQuery>,
) -> ApiResult<Json<Vec<EntityView>>> {
    let min = parse_price("min", query.min.as_deref())?;
    let max = parse_price("max", query.max.as_deref())?;
    let views = state.market_service.by_price_range(min, max).await?;
    Ok(Json(views))
}

async fn stocks_by_sector(
    State(state): State<Arc<AppState>>,
    Path(sector): Path<String>,
) -> ApiResult<Json<Vec<EntityView>>> {
    let views = state.market_service.by_sector(&sector).await?;
    Ok(Json(views))
}

async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<EntityView>> {
    let view = state.market_service.entity(&symbol).await?;
    Ok(Json(view))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stocks", get(list_stocks))
        .route("/stocks/sectors", get(list_sectors))
        .route("/stocks/page", get(stocks_page))
        .route("/stocks/price-range", get(stocks_by_price_range))
        .route("/stocks/sector/{sector}", get(stocks_by_sector))
        .route("/stocks/{symbol}", get(get_stock))
}
