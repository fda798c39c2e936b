/// Equipment model
///
/// Static reference data seeded by the `create_equipment` migration. The API
/// only reads it.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A piece of gym equipment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Equipment {
    pub id: Uuid,

    /// Display name, unique
    pub name: String,

    /// Category label (e.g. "Cardio", "Strength")
    pub equipment_type: String,

    /// Optional image reference (relative path or URL)
    pub image: Option<String>,
}

impl Equipment {
    /// Lists all equipment, optionally restricted to one category
    ///
    /// The category match is case-insensitive.
    pub async fn list(
        pool: &PgPool,
        equipment_type: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            r#"
            SELECT id, name, equipment_type, image
            FROM equipment
            WHERE $1::TEXT IS NULL OR LOWER(equipment_type) = LOWER($1)
            ORDER BY equipment_type ASC, name ASC
            "#,
        )
        .bind(equipment_type)
        .fetch_all(pool)
        .await
    }

    /// Finds one piece of equipment
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>(
            "SELECT id, name, equipment_type, image FROM equipment WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether an equipment row exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM equipment WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
