/// Admin panel endpoints
///
/// All routes here run behind both the JWT layer and the admin guard, so
/// handlers can assume the caller is an administrator.
///
/// - `GET /v1/admin/users` - Every non-admin member
/// - `GET /v1/admin/wins` - Every recorded win with its owner
/// - `POST /v1/admin/wins` - Record a win for a member
/// - `PUT /v1/admin/wins/:id` - Edit a win (fields left out are unchanged)
/// - `DELETE /v1/admin/wins/:id` - Delete a win

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use gymtrack_shared::{
    auth::middleware::AuthContext,
    models::{
        user::{User, UserSummary},
        win::{CreateWin, UpdateWin, Win, WinWithOwner},
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWinRequest {
    /// Member who won
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: String,

    #[validate(length(max = 500, message = "Image reference must be at most 500 characters"))]
    pub image: Option<String>,

    pub auction_date: NaiveDate,

    #[validate(range(min = 0.0, message = "Final bid cannot be negative"))]
    pub final_bid: f64,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWinRequest {
    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 500, message = "Image reference must be at most 500 characters"))]
    pub image: Option<String>,

    pub auction_date: Option<NaiveDate>,

    #[validate(range(min = 0.0, message = "Final bid cannot be negative"))]
    pub final_bid: Option<f64>,
}

impl CreateWinRequest {
    /// Trims the title and drops a blank image reference
    pub fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.image = self.image.take().filter(|i| !i.trim().is_empty());
    }
}

impl UpdateWinRequest {
    /// Trims the title; validation then sees what would be stored
    pub fn normalize(&mut self) {
        self.title = self.title.take().map(|t| t.trim().to_string());
    }
}

impl From<UpdateWinRequest> for UpdateWin {
    fn from(req: UpdateWinRequest) -> Self {
        Self {
            user_id: req.user_id,
            title: req.title,
            description: req.description,
            image: req.image,
            auction_date: req.auction_date,
            final_bid: req.final_bid,
        }
    }
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(User::list_members(&state.db).await?))
}

pub async fn list_wins(State(state): State<AppState>) -> ApiResult<Json<Vec<WinWithOwner>>> {
    Ok(Json(Win::list_all(&state.db).await?))
}

/// Record a win
///
/// # Errors
///
/// - `404 Not Found`: `user_id` does not exist
/// - `422 Unprocessable Entity`: validation failed
pub async fn create_win(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Json(mut req): Json<CreateWinRequest>,
) -> ApiResult<(StatusCode, Json<Win>)> {
    req.normalize();
    req.validate()?;

    let win = Win::create(
        &state.db,
        CreateWin {
            user_id: req.user_id,
            title: req.title,
            description: req.description,
            image: req.image,
            auction_date: req.auction_date,
            final_bid: req.final_bid,
        },
    )
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
        other => other,
    })?;

    tracing::info!(
        user_id = %admin.user_id,
        win_id = %win.id,
        winner = %win.user_id,
        "Win recorded"
    );

    Ok((StatusCode::CREATED, Json(win)))
}

/// Edit a win
///
/// # Errors
///
/// - `400 Bad Request`: body changes nothing
/// - `404 Not Found`: win or new owner does not exist
pub async fn update_win(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(mut req): Json<UpdateWinRequest>,
) -> ApiResult<Json<Win>> {
    req.normalize();
    req.validate()?;

    let update = UpdateWin::from(req);
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let win = Win::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Win not found".to_string()))?;

    tracing::info!(user_id = %admin.user_id, win_id = %win.id, "Win updated");

    Ok(Json(win))
}

pub async fn delete_win(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Win::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Win not found".to_string()));
    }

    tracing::info!(user_id = %admin.user_id, win_id = %id, "Win deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_win_validation() {
        let req: CreateWinRequest = serde_json::from_value(json!({
            "user_id": Uuid::new_v4(),
            "title": "Vintage rowing machine",
            "auction_date": "2025-06-01",
            "final_bid": 120.5
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.description, "");

        let req: CreateWinRequest = serde_json::from_value(json!({
            "user_id": Uuid::new_v4(),
            "title": "",
            "auction_date": "2025-06-01",
            "final_bid": -1.0
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("final_bid"));
    }

    #[test]
    fn test_update_win_request_conversion() {
        let req = UpdateWinRequest {
            final_bid: Some(99.0),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let update = UpdateWin::from(req);
        assert!(!update.is_empty());
        assert_eq!(update.final_bid, Some(99.0));
        assert!(update.title.is_none());

        assert!(UpdateWin::from(UpdateWinRequest::default()).is_empty());
    }

    #[test]
    fn test_blank_title_rejected_after_trimming() {
        let mut req: CreateWinRequest = serde_json::from_value(json!({
            "user_id": Uuid::new_v4(),
            "title": "   ",
            "image": "  ",
            "auction_date": "2025-06-01",
            "final_bid": 10.0
        }))
        .unwrap();
        req.normalize();
        assert!(req.image.is_none());
        assert!(req.validate().unwrap_err().field_errors().contains_key("title"));

        let mut req = UpdateWinRequest {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        req.normalize();
        assert!(req.validate().unwrap_err().field_errors().contains_key("title"));
    }

    #[test]
    fn test_title_is_stored_trimmed() {
        let mut req = UpdateWinRequest {
            title: Some("  Olympic barbell set ".to_string()),
            ..Default::default()
        };
        req.normalize();
        assert!(req.validate().is_ok());
        assert_eq!(
            UpdateWin::from(req).title.as_deref(),
            Some("Olympic barbell set")
        );
    }

    #[test]
    fn test_update_win_rejects_negative_bid() {
        let req = UpdateWinRequest {
            final_bid: Some(-0.01),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
