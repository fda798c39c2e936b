/// Database models for GymTrack
///
/// Each model owns its SQL. Handlers and the export tool call these functions
/// instead of writing queries inline.
///
/// # Models
///
/// - `user`: Members, credentials, admin flag and accrued balance
/// - `equipment`: Seeded equipment catalogue
/// - `usage_record`: Equipment sessions (open while `ended_at` is NULL)
/// - `win`: Auction wins recorded by the admin
///
/// # Example
///
/// ```no_run
/// use gymtrack_shared::models::equipment::Equipment;
/// use gymtrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::with_url("postgresql://localhost/gymtrack")).await?;
///
/// for item in Equipment::list(&pool, Some("Cardio")).await? {
///     println!("{} ({})", item.name, item.equipment_type);
/// }
/// # Ok(())
/// # }
/// ```

pub mod equipment;
pub mod usage_record;
pub mod user;
pub mod win;
