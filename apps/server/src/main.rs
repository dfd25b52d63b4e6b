use std::time::Duration;

use stockpulse_server::{
    api::app_router, build_state, config::Config, init_tracing, scheduler::SyncScheduler,
};
use tokio_util::sync::CancellationToken;

/// Upper bound for stopping background work after the listener closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Config parsing logs its warnings through tracing.
    init_tracing();
    let config = Config::from_env();
    let state = build_state(&config).await?;
    let shutdown = state.shutdown.clone();

    let hub = state.hub.start(&shutdown)?;
    let scheduler = SyncScheduler::start(state.clone(), &shutdown);

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    // Also reached when serve fails before any signal.
    shutdown.cancel();
    scheduler.stop(SHUTDOWN_GRACE).await;
    hub.stop(SHUTDOWN_GRACE).await;
    tracing::info!("Shutdown complete");
    served?;
    Ok(())
}
