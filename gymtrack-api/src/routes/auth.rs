/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Register a new member
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for an access token
///
/// There is no logout endpoint: tokens are stateless and the client simply
/// discards them.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use gymtrack_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        password,
    },
    models::user::{normalize_email, CreateUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength after the length rule
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 32, message = "Sex must be at most 32 characters"))]
    pub sex: Option<String>,

    /// Date of birth, `YYYY-MM-DD`
    pub dob: Option<NaiveDate>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of the authenticated user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub balance: f64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin,
            balance: user.balance,
        }
    }
}

/// Returned by register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn issue_tokens(user: &User, secret: &str) -> ApiResult<AuthResponse> {
    let access_claims = Claims::new(user.id, user.is_admin, TokenType::Access);
    let refresh_claims = Claims::new(user.id, user.is_admin, TokenType::Refresh);

    Ok(AuthResponse {
        user: UserProfile::from(user),
        access_token: jwt::create_token(&access_claims, secret)?,
        refresh_token: jwt::create_token(&refresh_claims, secret)?,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    })
}

/// Register a new member
///
/// ```text
/// POST /v1/auth/register
///
/// {
///   "email": "sam@example.com",
///   "password": "lift4ever",
///   "name": "Sam",
///   "sex": "F",
///   "dob": "1990-04-12"
/// }
/// ```
///
/// Emails listed in `ADMIN_EMAILS` are registered as administrators.
///
/// # Errors
///
/// - `409 Conflict`: email already registered (message does not echo it)
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    if let Err(message) = password::validate_password_strength(&req.password) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }]));
    }

    if let Some(dob) = req.dob {
        if dob > Utc::now().date_naive() {
            return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "dob".to_string(),
                message: "Date of birth cannot be in the future".to_string(),
            }]));
        }
    }

    let email = normalize_email(&req.email);
    let is_admin = state.config.admin.is_admin_email(&email);
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            name: req.name.trim().to_string(),
            sex: req.sex.filter(|s| !s.trim().is_empty()),
            dob: req.dob,
            is_admin,
        },
    )
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("Name or email already in use".to_string()),
        other => other,
    })?;

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User registered");

    Ok((StatusCode::CREATED, Json(issue_tokens(&user, state.jwt_secret())?)))
}

/// Login with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: "Invalid email or password" for both unknown email
///   and wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_tokens(&user, state.jwt_secret())?))
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: token invalid, expired, or not a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            sex: None,
            dob: None,
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register_request("sam@example.com", "lift4ever", "Sam")
            .validate()
            .is_ok());

        let errors = register_request("not-an-email", "short", "")
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_register_request_sex_length() {
        let mut req = register_request("sam@example.com", "lift4ever", "Sam");
        req.sex = Some("x".repeat(33));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_request_deserializes_dob() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"lift4ever","name":"A","dob":"1990-04-12"}"#,
        )
        .unwrap();
        assert_eq!(req.dob, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert!(req.sex.is_none());
    }

    #[test]
    fn test_issue_tokens() {
        let secret = "a-test-secret-that-is-at-least-32-bytes";
        let user = User {
            id: Uuid::new_v4(),
            email: "sam@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: "Sam".to_string(),
            sex: None,
            dob: None,
            is_admin: true,
            balance: 1.5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        };

        let response = issue_tokens(&user, secret).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 24 * 3600);

        let access = jwt::validate_access_token(&response.access_token, secret).unwrap();
        assert_eq!(access.sub, user.id);
        assert!(access.is_admin);

        assert!(jwt::validate_refresh_token(&response.refresh_token, secret).is_ok());
        assert!(jwt::validate_access_token(&response.refresh_token, secret).is_err());

        let json = serde_json::to_value(&response.user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
