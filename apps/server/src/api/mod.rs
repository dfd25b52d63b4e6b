use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, main_lib::AppState, ws};

pub mod calls;
pub mod health;
pub mod market;
pub mod quota;
pub mod stocks;
pub mod sync;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let timed = Router::new()
        .merge(health::router())
        .merge(quota::router())
        .merge(sync::router())
        .merge(stocks::router())
        .merge(market::router())
        .merge(calls::router())
        .layer(TimeoutLayer::new(config.request_timeout));

    // Manual syncs and socket sessions can outlast the request timeout;
    // they are added after the layer so it does not wrap them.
    let api = timed.merge(sync::trigger_router());

    Router::new()
        .nest("/api/v1", api)
        .route("/ws", get(ws::subscribe))
        .with_state(state)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
