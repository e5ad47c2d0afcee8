//! Public system endpoints and the authentication layer

use axum::http::StatusCode;

mod common;
use common::*;

#[tokio::test]
async fn test_health_check_is_public() {
    let (_, app) = test_app().await;

    let (status, body) = send(app, "GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_version_is_public() {
    let (_, app) = test_app().await;

    let (status, body) = send(app, "GET", "/api/v1/system/version", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "eduadmin");
    assert!(!body["data"]["version"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let (_, app) = test_app().await;

    let (status, body) = send(app, "GET", "/api/v1/menu", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_token_for_unknown_user_is_unauthorized() {
    let (_, app) = test_app().await;

    let (status, _) = authenticated_get(app, "/api/v1/user/me/permissions", &token_for(777)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_permissions_for_plain_user() {
    let (state, app) = test_app().await;
    let member = create_test_user_with_role(&state.db, "student", "User").await;

    let (status, body) =
        authenticated_get(app, "/api/v1/user/me/permissions", &token_for(member.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["permissions"], serde_json::json!(["dashboard.view"]));
}
