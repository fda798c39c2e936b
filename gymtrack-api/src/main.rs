//! # GymTrack API Server
//!
//! Serves the member and admin HTTP API. Each session start spawns a balance
//! accrual task that runs until the session ends, its tick limit is reached,
//! or the server shuts down.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/gymtrack JWT_SECRET=... cargo run -p gymtrack-api
//! ```

use gymtrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use gymtrack_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use gymtrack_worker::{ledger::PgBalanceLedger, supervisor::AccrualSupervisor};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gymtrack_api=debug,gymtrack_worker=debug,gymtrack_shared=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "GymTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::with_url(config.database.url.clone())
    })
    .await?;

    run_migrations(&pool).await?;

    let policy = config.accrual.policy();
    tracing::info!(
        rate_per_hour = policy.rate_per_hour,
        interval_secs = policy.interval.as_secs(),
        max_ticks = policy.max_ticks,
        "Balance accrual configured"
    );

    let accruals = AccrualSupervisor::new(Arc::new(PgBalanceLedger::new(pool.clone())), policy);

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, accruals.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    accruals.shutdown().await;
    close_pool(pool).await;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
