//! # GymTrack Export
//!
//! Writes the full equipment usage log to an XML file.
//!
//! ## Usage
//!
//! ```bash
//! gymtrack-export --database-url postgres://localhost/gymtrack --output usage.xml
//! ```

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use gymtrack_export::{run_export, DEFAULT_OUTPUT};
use gymtrack_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "gymtrack-export",
    version = env!("CARGO_PKG_VERSION"),
    about = "Export the gym usage log to XML",
    long_about = None
)]
struct Cli {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// File to write
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymtrack_export=info,gymtrack_shared=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    run(cli).await.inspect_err(|e| {
        tracing::error!("Export failed: {:#}", e);
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = create_pool(DatabaseConfig {
        max_connections: 2,
        min_connections: 0,
        connect_timeout_seconds: 10,
        ..DatabaseConfig::with_url(cli.database_url)
    })
    .await
    .context("Could not connect to the database")?;

    let result = run_export(&pool, &cli.output, Utc::now().date_naive()).await;
    close_pool(pool).await;

    let summary = result.with_context(|| format!("Exporting to {}", cli.output.display()))?;

    tracing::info!(
        entries = summary.entries,
        bytes = summary.bytes,
        output = %cli.output.display(),
        "Usage data exported"
    );
    Ok(())
}
