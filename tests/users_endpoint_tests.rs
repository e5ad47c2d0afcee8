//! Users endpoint integration tests
//!
//! Covers:
//! - `GET /api/v1/user` and `GET /api/v1/user/{id}` (requires users.view)
//! - `POST`/`PUT /api/v1/user` with role assignment replacement
//! - `DELETE /api/v1/user/{id}` soft delete
//! - `GET /api/v1/user/{id}/permissions` and `/me/permissions`

use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

mod common;
use common::*;

use eduadmin::models::prelude::*;

fn role_names(user: &serde_json::Value) -> Vec<String> {
    user["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_list_users_includes_inactive() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;
    let token = token_for(admin.id);
    let gone = create_test_user_with_role(&state.db, "gone", "User").await;

    let (status, _) =
        authenticated_delete(app.clone(), &format!("/api/v1/user/{}", gone.id), &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = authenticated_get(app, "/api/v1/user", &token).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    let listed = users.iter().find(|u| u["id"] == gone.id).unwrap();
    assert_eq!(listed["isActive"], false);
    assert!(listed["roles"].as_array().unwrap().is_empty());
    assert!(listed.get("hashedPassword").is_none());
}

#[tokio::test]
async fn test_create_user_with_roles() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;
    let member_role = find_role(&state.db, "User").await;
    let reviewer = create_test_role(&state.db, "Reviewer").await;

    let (status, body) = authenticated_post(
        app,
        "/api/v1/user",
        &token_for(admin.id),
        json!({
            "username": "instructor1",
            "email": "Instructor1@School.EDU",
            "password": "correct-horse",
            "fullName": "First Instructor",
            "roleIds": [reviewer.id, member_role.id]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let created = &body["data"]["user"];
    assert_eq!(created["email"], "instructor1@school.edu");
    assert_eq!(created["isActive"], true);
    assert_eq!(created["createdBy"], admin.id);
    assert_eq!(role_names(created), vec!["User", "Reviewer"]);
}

#[tokio::test]
async fn test_create_user_reports_every_violation() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;

    let (status, body) = authenticated_post(
        app,
        "/api/v1/user",
        &token_for(admin.id),
        json!({
            "username": "useradmin",
            "email": "useradmin@example.com",
            "password": "short",
            "roleIds": [424242]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let errors: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(
        errors,
        vec![
            "Password must be between 8 and 128 characters",
            "Username 'useradmin' already exists",
            "Email 'useradmin@example.com' already exists",
            "Role 424242 does not exist or is inactive",
        ]
    );
}

#[tokio::test]
async fn test_update_user_replaces_roles() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;
    let target = create_test_user_with_role(&state.db, "student1", "User").await;
    let reviewer = create_test_role(&state.db, "Reviewer").await;
    let member_role = find_role(&state.db, "User").await;

    let (status, body) = authenticated_put(
        app,
        &format!("/api/v1/user/{}", target.id),
        &token_for(admin.id),
        json!({
            "username": "student1",
            "email": "student1@example.com",
            "fullName": "Student One",
            "roleIds": [reviewer.id]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(role_names(&body["data"]["user"]), vec!["Reviewer"]);
    assert_eq!(body["data"]["user"]["fullName"], "Student One");

    let dropped = UserRole::find()
        .filter(user_role::Column::UserId.eq(target.id))
        .filter(user_role::Column::RoleId.eq(member_role.id))
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!dropped.is_active);
}

#[tokio::test]
async fn test_update_user_cannot_deactivate_self() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;
    let admin_role = find_role(&state.db, "Admin").await;

    let (status, body) = authenticated_put(
        app,
        &format!("/api/v1/user/{}", admin.id),
        &token_for(admin.id),
        json!({
            "username": "useradmin",
            "email": "useradmin@example.com",
            "isActive": false,
            "roleIds": [admin_role.id]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["You cannot deactivate your own account"]));
}

#[tokio::test]
async fn test_delete_user_deactivates_assignments() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;
    let target = create_test_user_with_role(&state.db, "student1", "User").await;

    let (status, body) = authenticated_delete(
        app.clone(),
        &format!("/api/v1/user/{}", target.id),
        &token_for(admin.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let stored = User::find_by_id(target.id).one(&state.db).await.unwrap().unwrap();
    assert!(!stored.is_active);
    let assignments = UserRole::find()
        .filter(user_role::Column::UserId.eq(target.id))
        .all(&state.db)
        .await
        .unwrap();
    assert_eq!(assignments.len(), 1);
    assert!(assignments.iter().all(|a| !a.is_active));

    // Deactivated users can no longer authenticate
    let (status, _) = authenticated_get(app, "/api/v1/user/me/permissions", &token_for(target.id)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_self_is_rejected() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;

    let (status, body) = authenticated_delete(
        app,
        &format!("/api/v1/user/{}", admin.id),
        &token_for(admin.id),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You cannot delete your own account");
}

#[tokio::test]
async fn test_get_missing_user_returns_404() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;

    let (status, _) = authenticated_get(app, "/api/v1/user/99999", &token_for(admin.id)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_permissions_union_of_roles() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "useradmin", "Admin").await;
    let target = create_test_user_with_role(&state.db, "student1", "User").await;
    let reviewer = create_test_role(&state.db, "Reviewer").await;
    let roles_view = find_permission(&state.db, "roles.view").await;
    grant(&state.db, reviewer.id, roles_view.id, true).await;
    assign_role(&state.db, target.id, reviewer.id).await;

    let (status, body) = authenticated_get(
        app,
        &format!("/api/v1/user/{}/permissions", target.id),
        &token_for(admin.id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["permissions"],
        json!(["dashboard.view", "roles.view"])
    );
}

#[tokio::test]
async fn test_users_view_required() {
    let (state, app) = test_app().await;
    let member = create_test_user_with_role(&state.db, "student1", "User").await;

    let (status, body) = authenticated_get(app, "/api/v1/user", &token_for(member.id)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}
