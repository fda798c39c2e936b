/// Usage record model: the persistent log of equipment sessions
///
/// A row is inserted when a member starts using a piece of equipment and is
/// updated exactly once when they stop. A row whose `ended_at` is NULL is an
/// *open session*.
///
/// # Open sessions per pair
///
/// Nothing in the schema prevents several open rows for the same
/// (user, equipment) pair. Starting always inserts; ending closes only the
/// most recent open row for the pair.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE usage_records (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     equipment_id UUID NOT NULL REFERENCES equipment(id) ON DELETE RESTRICT,
///     started_at TIMESTAMPTZ NOT NULL,
///     ended_at TIMESTAMPTZ,
///     hours_used DOUBLE PRECISION
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use gymtrack_shared::models::usage_record::UsageRecord;
/// use chrono::Utc;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, equipment_id: Uuid) -> Result<(), sqlx::Error> {
/// let open = UsageRecord::start(&pool, user_id, equipment_id, Utc::now()).await?;
///
/// if let Some(closed) = UsageRecord::end_latest_open(&pool, user_id, equipment_id, Utc::now()).await? {
///     println!("used for {:?} hours", closed.hours_used);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, user_id, equipment_id, started_at, ended_at, hours_used";

/// One equipment session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageRecord {
    pub id: Uuid,

    /// Member who used the equipment
    pub user_id: Uuid,

    /// Equipment used
    pub equipment_id: Uuid,

    /// Session start
    pub started_at: DateTime<Utc>,

    /// Session end, None while the session is open
    pub ended_at: Option<DateTime<Utc>>,

    /// Elapsed hours rounded to two decimals, set together with `ended_at`
    pub hours_used: Option<f64>,
}

/// Usage row joined with the equipment name, for history and dashboards
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageWithEquipment {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub equipment_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub hours_used: Option<f64>,
}

/// Hours between `start` and `end`, rounded half-up to two decimal places
///
/// Works on whole seconds: `90s` is `0.025h`, which rounds to `0.03`. An end
/// before the start (clock skew) counts as zero.
pub fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let seconds = (end - start).num_seconds().max(0);
    // hundredths of an hour, rounded half-up in integer arithmetic
    let hundredths = (seconds * 100 + 1800) / 3600;
    hundredths as f64 / 100.0
}

impl UsageRecord {
    /// Whether the session is still open
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Inserts a new open session
    ///
    /// Does not look at existing open sessions for the pair.
    pub async fn start(
        pool: &PgPool,
        user_id: Uuid,
        equipment_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        Self::start_with_id(pool, Uuid::new_v4(), user_id, equipment_id, started_at).await
    }

    /// Inserts a new open session under a caller-chosen id
    ///
    /// Lets the caller register work against the id before the row exists.
    pub async fn start_with_id(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        equipment_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO usage_records (id, user_id, equipment_id, started_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {RECORD_COLUMNS}"
        );

        sqlx::query_as::<_, UsageRecord>(&query)
            .bind(id)
            .bind(user_id)
            .bind(equipment_id)
            .bind(started_at)
            .fetch_one(pool)
            .await
    }

    /// Finds the most recent open session for a (user, equipment) pair
    pub async fn find_latest_open(
        pool: &PgPool,
        user_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM usage_records \
             WHERE user_id = $1 AND equipment_id = $2 AND ended_at IS NULL \
             ORDER BY started_at DESC \
             LIMIT 1"
        );

        sqlx::query_as::<_, UsageRecord>(&query)
            .bind(user_id)
            .bind(equipment_id)
            .fetch_optional(pool)
            .await
    }

    /// Closes the most recent open session for the pair
    ///
    /// Returns the closed record, or `None` when there was no open session.
    /// In the `None` case no row is created or modified. The update is guarded
    /// by `ended_at IS NULL`, so a session raced to completion by another
    /// request is reported as `None` rather than closed twice.
    pub async fn end_latest_open(
        pool: &PgPool,
        user_id: Uuid,
        equipment_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(open) = Self::find_latest_open(pool, user_id, equipment_id).await? else {
            return Ok(None);
        };

        let hours = elapsed_hours(open.started_at, ended_at);

        let query = format!(
            "UPDATE usage_records \
             SET ended_at = $2, hours_used = $3 \
             WHERE id = $1 AND ended_at IS NULL \
             RETURNING {RECORD_COLUMNS}"
        );

        sqlx::query_as::<_, UsageRecord>(&query)
            .bind(open.id)
            .bind(ended_at)
            .bind(hours)
            .fetch_optional(pool)
            .await
    }

    /// Finds a record by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM usage_records WHERE id = $1");

        sqlx::query_as::<_, UsageRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A member's usage history, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<UsageWithEquipment>, sqlx::Error> {
        sqlx::query_as::<_, UsageWithEquipment>(
            r#"
            SELECT u.id, u.equipment_id, e.name AS equipment_name,
                   e.equipment_type, u.started_at, u.ended_at, u.hours_used
            FROM usage_records u
            JOIN equipment e ON e.id = u.equipment_id
            WHERE u.user_id = $1
            ORDER BY u.started_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// All of a member's open sessions, newest first
    pub async fn list_open_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<UsageWithEquipment>, sqlx::Error> {
        sqlx::query_as::<_, UsageWithEquipment>(
            r#"
            SELECT u.id, u.equipment_id, e.name AS equipment_name,
                   e.equipment_type, u.started_at, u.ended_at, u.hours_used
            FROM usage_records u
            JOIN equipment e ON e.id = u.equipment_id
            WHERE u.user_id = $1 AND u.ended_at IS NULL
            ORDER BY u.started_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Counts open sessions for a pair
    pub async fn count_open(
        pool: &PgPool,
        user_id: Uuid,
        equipment_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM usage_records
            WHERE user_id = $1 AND equipment_id = $2 AND ended_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(equipment_id)
        .fetch_one(pool)
        .await
    }
}
