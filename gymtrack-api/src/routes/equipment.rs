/// Equipment catalogue endpoints
///
/// - `GET /v1/equipment?type=Cardio` - List equipment, optionally by category
/// - `GET /v1/equipment/:id` - One piece of equipment

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use gymtrack_shared::models::equipment::Equipment;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct EquipmentQuery {
    /// Case-insensitive category filter
    #[serde(rename = "type")]
    pub equipment_type: Option<String>,
}

pub async fn list_equipment(
    State(state): State<AppState>,
    Query(query): Query<EquipmentQuery>,
) -> ApiResult<Json<Vec<Equipment>>> {
    let filter = query
        .equipment_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    Ok(Json(Equipment::list(&state.db, filter).await?))
}

pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Equipment>> {
    Equipment::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Equipment not found".to_string()))
}
