/// Router tests that never touch the database
///
/// The app runs over a lazily-connected pool pointing at a closed port, so
/// these cover authentication, authorization and validation paths that must
/// reject a request before any query runs.

mod common;

use axum::http::StatusCode;
use common::{lazy_app, send, token_for};
use gymtrack_shared::auth::jwt::{create_token, Claims, TokenType};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_member_routes_require_token() {
    let app = lazy_app();

    for uri in ["/v1/equipment", "/v1/usage", "/v1/dashboard", "/v1/wins"] {
        let (status, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_usage_action_requires_token() {
    let app = lazy_app();

    let (status, _) = send(
        &app,
        "POST",
        "/v1/usage/action",
        None,
        Some(json!({ "equipment_id": Uuid::new_v4(), "action": "start" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_tokens_rejected() {
    let app = lazy_app();

    let (status, _) = send(&app, "GET", "/v1/wins", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signed_elsewhere = create_token(
        &Claims::new(Uuid::new_v4(), false, TokenType::Access),
        "some-other-secret-that-is-32-bytes-long",
    )
    .unwrap();
    let (status, _) = send(&app, "GET", "/v1/wins", Some(&signed_elsewhere), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = create_token(
        &Claims::new(Uuid::new_v4(), false, TokenType::Refresh),
        common::TEST_SECRET,
    )
    .unwrap();
    let (status, body) = send(&app, "GET", "/v1/wins", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let expired = create_token(
        &Claims::with_expiration(
            Uuid::new_v4(),
            false,
            TokenType::Access,
            chrono::Duration::seconds(-60),
        ),
        common::TEST_SECRET,
    )
    .unwrap();

    let (status, _) = send(&lazy_app(), "GET", "/v1/dashboard", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_members() {
    let app = lazy_app();
    let member = token_for(Uuid::new_v4(), false);
    let win_id = Uuid::new_v4();

    let cases = [
        ("GET", "/v1/admin/users".to_string()),
        ("GET", "/v1/admin/wins".to_string()),
        ("POST", "/v1/admin/wins".to_string()),
        ("PUT", format!("/v1/admin/wins/{}", win_id)),
        ("DELETE", format!("/v1/admin/wins/{}", win_id)),
    ];

    for (method, uri) in cases {
        let body = matches!(method, "POST" | "PUT").then(|| json!({}));
        let (status, json) = send(&app, method, &uri, Some(&member), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(json["error"], "forbidden");
    }
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let (status, _) = send(&lazy_app(), "GET", "/v1/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_create_win_validation() {
    let admin = token_for(Uuid::new_v4(), true);

    let (status, body) = send(
        &lazy_app(),
        "POST",
        "/v1/admin/wins",
        Some(&admin),
        Some(json!({
            "user_id": Uuid::new_v4(),
            "title": "",
            "auction_date": "2025-06-01",
            "final_bid": -5.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["final_bid", "title"]);
}

#[tokio::test]
async fn test_admin_blank_win_title_rejected() {
    let admin = token_for(Uuid::new_v4(), true);
    let app = lazy_app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/admin/wins",
        Some(&admin),
        Some(json!({
            "user_id": Uuid::new_v4(),
            "title": "   ",
            "auction_date": "2025-06-01",
            "final_bid": 5.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/v1/admin/wins/{}", Uuid::new_v4()),
        Some(&admin),
        Some(json!({ "title": "\t " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_admin_update_win_needs_fields() {
    let admin = token_for(Uuid::new_v4(), true);

    let (status, body) = send(
        &lazy_app(),
        "PUT",
        &format!("/v1/admin/wins/{}", Uuid::new_v4()),
        Some(&admin),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");
}

#[tokio::test]
async fn test_register_validation() {
    let (status, body) = send(
        &lazy_app(),
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "email": "nope", "password": "short", "name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_register_rejects_weak_password_and_future_dob() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({ "email": "a@b.co", "password": "allletters", "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "a@b.co",
            "password": "lift4ever",
            "name": "A",
            "dob": "2999-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "dob");
}

#[tokio::test]
async fn test_refresh_rejects_garbage_and_access_tokens() {
    let app = lazy_app();

    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": "garbage" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let access = token_for(Uuid::new_v4(), false);
    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_access_token() {
    let user_id = Uuid::new_v4();
    let refresh = create_token(
        &Claims::new(user_id, true, TokenType::Refresh),
        common::TEST_SECRET,
    )
    .unwrap();

    let (status, body) = send(
        &lazy_app(),
        "POST",
        "/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    let claims = gymtrack_shared::auth::jwt::validate_access_token(
        body["access_token"].as_str().unwrap(),
        common::TEST_SECRET,
    )
    .unwrap();
    assert_eq!(claims.sub, user_id);
    assert!(claims.is_admin);
}

#[tokio::test]
async fn test_health_reports_degraded_database() {
    let (status, body) = send(&lazy_app(), "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["active_accruals"], 0);
}

#[tokio::test]
async fn test_error_responses_carry_security_headers() {
    let app = lazy_app();

    let request = axum::http::Request::builder()
        .uri("/v1/dashboard")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["cache-control"], "no-store");
}
