/// Database layer for GymTrack
///
/// Every component that touches storage (API handlers, accrual ticks, the
/// export tool) goes through a shared `PgPool`; connections are acquired per
/// query and returned to the pool when the query finishes.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Schema migration runner (SQL files under `migrations/`)
///
/// # Example
///
/// ```no_run
/// use gymtrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::with_url(std::env::var("DATABASE_URL")?);
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
