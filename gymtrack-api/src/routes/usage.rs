/// Equipment usage endpoints
///
/// - `POST /v1/usage/action` - Start or end a session on a piece of equipment
/// - `GET /v1/usage?limit=50` - The caller's usage history, newest first
///
/// Starting a session registers a balance accrual loop under a fresh record
/// id and then inserts the open usage record with that id. Ending closes the caller's most recent open record
/// for that equipment, stamps the elapsed hours, and cancels that record's
/// accrual loop. Ending when nothing is open is not an error; the response
/// just reports `closed: false`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use gymtrack_shared::{
    auth::middleware::AuthContext,
    models::{
        equipment::Equipment,
        usage_record::{UsageRecord, UsageWithEquipment},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageAction {
    Start,
    End,
}

#[derive(Debug, Deserialize)]
pub struct UsageActionRequest {
    pub equipment_id: Uuid,
    pub action: UsageAction,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum UsageActionResponse {
    /// A new open session
    Start { usage: UsageRecord },

    /// `usage` is the closed record when `closed` is true
    End {
        closed: bool,
        usage: Option<UsageRecord>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Start or end a session
///
/// ```text
/// POST /v1/usage/action
///
/// { "equipment_id": "uuid", "action": "start" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: unknown equipment on start
/// - `422 Unprocessable Entity`: malformed body or unknown action
pub async fn usage_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UsageActionRequest>,
) -> ApiResult<Json<UsageActionResponse>> {
    match req.action {
        UsageAction::Start => {
            if !Equipment::exists(&state.db, req.equipment_id).await? {
                return Err(ApiError::NotFound("Equipment not found".to_string()));
            }

            let usage = state
                .accruals
                .spawn_for_new_record(auth.user_id, |usage_id| {
                    UsageRecord::start_with_id(
                        &state.db,
                        usage_id,
                        auth.user_id,
                        req.equipment_id,
                        Utc::now(),
                    )
                })
                .await?;

            tracing::info!(
                user_id = %auth.user_id,
                equipment_id = %req.equipment_id,
                usage_id = %usage.id,
                "Usage started"
            );

            Ok(Json(UsageActionResponse::Start { usage }))
        }
        UsageAction::End => {
            let closed = UsageRecord::end_latest_open(
                &state.db,
                auth.user_id,
                req.equipment_id,
                Utc::now(),
            )
            .await?;

            match &closed {
                Some(usage) => {
                    state.accruals.cancel(usage.id).await;
                    tracing::info!(
                        user_id = %auth.user_id,
                        usage_id = %usage.id,
                        hours_used = ?usage.hours_used,
                        "Usage ended"
                    );
                }
                None => {
                    tracing::debug!(
                        user_id = %auth.user_id,
                        equipment_id = %req.equipment_id,
                        "End requested with no open session"
                    );
                }
            }

            Ok(Json(UsageActionResponse::End {
                closed: closed.is_some(),
                usage: closed,
            }))
        }
    }
}

/// The caller's usage history
pub async fn list_usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<UsageWithEquipment>>> {
    let limit = clamp_limit(query.limit);
    Ok(Json(
        UsageRecord::list_for_user(&state.db, auth.user_id, limit).await?,
    ))
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}
