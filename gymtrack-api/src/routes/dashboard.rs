/// Member dashboard
///
/// `GET /v1/dashboard` returns everything the member home screen shows in
/// one round trip: the current balance, the equipment catalogue, the
/// member's open sessions and their auction wins.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::UserProfile,
};
use axum::{extract::State, Extension, Json};
use gymtrack_shared::{
    auth::middleware::AuthContext,
    models::{
        equipment::Equipment,
        usage_record::{UsageRecord, UsageWithEquipment},
        user::User,
        win::Win,
    },
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserProfile,
    pub equipment: Vec<Equipment>,
    pub open_sessions: Vec<UsageWithEquipment>,
    pub wins: Vec<Win>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    // a valid token for a deleted account
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (equipment, open_sessions, wins) = tokio::try_join!(
        Equipment::list(&state.db, None),
        UsageRecord::list_open_for_user(&state.db, user.id),
        Win::list_for_user(&state.db, user.id),
    )?;

    Ok(Json(DashboardResponse {
        user: UserProfile::from(&user),
        equipment,
        open_sessions,
        wins,
    }))
}
