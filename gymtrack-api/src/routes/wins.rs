/// `GET /v1/wins` - auction wins recorded for the caller, newest first

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use gymtrack_shared::{auth::middleware::AuthContext, models::win::Win};

pub async fn my_wins(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Win>>> {
    Ok(Json(Win::list_for_user(&state.db, auth.user_id).await?))
}
