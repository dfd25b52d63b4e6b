use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{extract::State, routing::get, Json, Router};
use stockpulse_core::quota::QuotaStatus;

async fn get_quota(State(state): State<Arc<AppState>>) -> ApiResult<Json<QuotaStatus>> {
    let status = state.ledger.current().await?;
    Ok(Json(status))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/quota", get(get_quota))
}
