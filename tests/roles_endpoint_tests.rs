//! Roles endpoint integration tests
//!
//! Covers:
//! - `GET /api/v1/role`: list roles (requires roles.view)
//! - `GET /api/v1/role/{id}`: get role by ID (requires roles.view)
//! - `POST /api/v1/role`: create role with menu visibility (requires roles.create)
//! - `PUT /api/v1/role/{id}`: replace role and menus (requires roles.edit)
//! - `PUT /api/v1/role/{id}/permissions/{pid}`: grant toggle (requires roles.edit)
//! - `DELETE /api/v1/role/{id}`: soft delete, conflict and forced cascade

use axum::http::StatusCode;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

mod common;
use common::*;

use eduadmin::models::prelude::*;

#[tokio::test]
async fn test_list_roles_requires_auth() {
    let (_, app) = test_app().await;

    let (status, body) = send(app, "GET", "/api/v1/role", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_list_roles_rejects_invalid_token() {
    let (_, app) = test_app().await;

    let (status, _) = send(app, "GET", "/api/v1/role", Some("not-a-jwt"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_roles_as_admin() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;

    let (status, body) = authenticated_get(app, "/api/v1/role", &token_for(admin.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let names: Vec<&str> = body["data"]["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"SuperAdmin"));
    assert!(names.contains(&"Admin"));
    assert!(names.contains(&"User"));
}

#[tokio::test]
async fn test_list_roles_forbidden_without_permission() {
    let (state, app) = test_app().await;
    let member = create_test_user_with_role(&state.db, "member", "User").await;

    let (status, body) = authenticated_get(app, "/api/v1/role", &token_for(member.id)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("roles.view"));
}

#[tokio::test]
async fn test_create_role_then_get_returns_its_menus() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let token = token_for(admin.id);
    let users_menu = find_menu(&state.db, "users").await;
    let roles_menu = find_menu(&state.db, "roles").await;

    let (status, body) = authenticated_post(
        app.clone(),
        "/api/v1/role",
        &token,
        json!({
            "name": "Instructor",
            "description": "Course staff",
            "isActive": true,
            "menuIds": [users_menu.id, roles_menu.id]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let role_id = body["data"]["role"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["role"]["createdBy"], admin.id);

    let (status, body) =
        authenticated_get(app, &format!("/api/v1/role/{}", role_id), &token).await;
    assert_eq!(status, StatusCode::OK);

    let mut menu_ids: Vec<i64> = body["data"]["role"]["menus"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    menu_ids.sort();
    let mut expected = vec![users_menu.id, roles_menu.id];
    expected.sort();
    assert_eq!(menu_ids, expected);
    assert_eq!(body["data"]["role"]["isSystem"], false);
}

#[tokio::test]
async fn test_create_role_lists_every_violation() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;

    let (status, body) = authenticated_post(
        app,
        "/api/v1/role",
        &token_for(admin.id),
        json!({
            "name": "Admin",
            "menuIds": [9999],
            "permissionIds": [8888]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors.iter().any(|e| e.contains("already exists")));
    assert!(errors.iter().any(|e| e.contains("Menu 9999")));
    assert!(errors.iter().any(|e| e.contains("Permission 8888")));
}

#[tokio::test]
async fn test_create_role_rejects_short_name() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;

    let (status, body) = authenticated_post(
        app,
        "/api/v1/role",
        &token_for(admin.id),
        json!({ "name": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"][0]
        .as_str()
        .unwrap()
        .contains("between 2 and 50"));
}

#[tokio::test]
async fn test_update_role_replaces_menus() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let token = token_for(admin.id);
    let users_menu = find_menu(&state.db, "users").await;
    let menus_menu = find_menu(&state.db, "menus").await;

    let (_, body) = authenticated_post(
        app.clone(),
        "/api/v1/role",
        &token,
        json!({ "name": "Auditor", "menuIds": [users_menu.id] }),
    )
    .await;
    let role_id = body["data"]["role"]["id"].as_i64().unwrap();

    let (status, body) = authenticated_put(
        app,
        &format!("/api/v1/role/{}", role_id),
        &token,
        json!({ "name": "Auditors", "isActive": true, "menuIds": [menus_menu.id] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["role"]["name"], "Auditors");
    assert_eq!(body["data"]["role"]["updatedBy"], admin.id);
    let menus = body["data"]["role"]["menus"].as_array().unwrap();
    assert_eq!(menus.len(), 1);
    assert_eq!(menus[0]["id"], menus_menu.id);

    let rows = RoleMenu::find()
        .filter(role_menu::Column::RoleId.eq(role_id))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_system_role_cannot_be_renamed_or_deactivated() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let member_role = find_role(&state.db, "User").await;

    let (status, body) = authenticated_put(
        app,
        &format!("/api/v1/role/{}", member_role.id),
        &token_for(admin.id),
        json!({ "name": "Members", "isActive": false, "menuIds": [] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e == "System roles cannot be renamed"));
    assert!(errors.iter().any(|e| e == "System roles cannot be deactivated"));
}

#[tokio::test]
async fn test_delete_system_role_fails() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let member_role = find_role(&state.db, "User").await;

    let (status, _) = authenticated_delete(
        app,
        &format!("/api/v1/role/{}?forceDelete=true", member_role.id),
        &token_for(admin.id),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_assigned_role_requires_force() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let token = token_for(admin.id);
    let role = create_test_role(&state.db, "Graders").await;
    for name in ["grader1", "grader2", "grader3"] {
        let u = create_test_user(&state.db, name).await;
        assign_role(&state.db, u.id, role.id).await;
    }

    let (status, body) = authenticated_delete(
        app.clone(),
        &format!("/api/v1/role/{}", role.id),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("forceDelete=true"));

    let remaining = UserRole::find()
        .filter(user_role::Column::RoleId.eq(role.id))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 3, "a refused delete must not remove assignments");

    let (status, body) = authenticated_delete(
        app.clone(),
        &format!("/api/v1/role/{}?forceDelete=true", role.id),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["affectedUsersCount"], 3);
    assert!(body["data"]["warnings"].as_array().unwrap().is_empty());

    let remaining = UserRole::find()
        .filter(user_role::Column::RoleId.eq(role.id))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let stored = Role::find_by_id(role.id).one(&state.db).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.updated_by, Some(admin.id));

    let (status, _) = authenticated_get(app, &format!("/api/v1/role/{}", role.id), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unassigned_role() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let role = create_test_role(&state.db, "Unused").await;

    let (status, body) = authenticated_delete(
        app,
        &format!("/api/v1/role/{}", role.id),
        &token_for(admin.id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["affectedUsersCount"], 0);
}

#[tokio::test]
async fn test_get_missing_role_returns_404() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;

    let (status, body) =
        authenticated_get(app, "/api/v1/role/424242", &token_for(admin.id)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Role not found");
}

#[tokio::test]
async fn test_grant_toggle_changes_effective_permissions() {
    let (state, app) = test_app().await;
    let admin = create_test_user_with_role(&state.db, "rolesadmin", "SuperAdmin").await;
    let admin_token = token_for(admin.id);
    let role = create_test_role(&state.db, "Viewers").await;
    let viewer = create_test_user(&state.db, "viewer").await;
    assign_role(&state.db, viewer.id, role.id).await;
    let users_view = find_permission(&state.db, "users.view").await;
    let grant_uri = format!("/api/v1/role/{}/permissions/{}", role.id, users_view.id);

    let (status, body) = authenticated_put(
        app.clone(),
        &grant_uri,
        &admin_token,
        json!({ "isGranted": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["permissionKey"], "users.view");

    let (_, body) =
        authenticated_get(app.clone(), "/api/v1/user/me/permissions", &token_for(viewer.id)).await;
    assert_eq!(body["data"]["permissions"], json!(["users.view"]));

    let (status, body) = authenticated_put(
        app.clone(),
        &grant_uri,
        &admin_token,
        json!({ "isGranted": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Permission revoked");

    let (_, body) =
        authenticated_get(app, "/api/v1/user/me/permissions", &token_for(viewer.id)).await;
    assert_eq!(body["data"]["permissions"], json!([]));

    let rows = RolePermission::find()
        .filter(role_permission::Column::RoleId.eq(role.id))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(rows, 1, "revocation keeps the grant row");
}
