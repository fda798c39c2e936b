/// The joined usage log read by the exporter

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

/// One usage record with its member and equipment details
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UsageExportRow {
    pub user_name: String,
    pub email: String,
    pub sex: Option<String>,
    pub dob: Option<NaiveDate>,
    pub equipment_name: String,
    pub equipment_type: String,
    pub usage_date: DateTime<Utc>,
    pub end_usage_date: Option<DateTime<Utc>>,
    pub hours_used: Option<f64>,
}

/// Every usage record, oldest session first
///
/// Open sessions are included with empty end and hours.
pub async fn fetch_usage_rows(pool: &PgPool) -> Result<Vec<UsageExportRow>, sqlx::Error> {
    sqlx::query_as::<_, UsageExportRow>(
        r#"
        SELECT
            u.name AS user_name,
            u.email,
            u.sex,
            u.dob,
            e.name AS equipment_name,
            e.equipment_type,
            r.started_at AS usage_date,
            r.ended_at AS end_usage_date,
            r.hours_used
        FROM usage_records r
        JOIN users u ON u.id = r.user_id
        JOIN equipment e ON e.id = r.equipment_id
        ORDER BY r.started_at ASC, r.id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}
