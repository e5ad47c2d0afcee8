//! Test helpers and utilities for integration testing.
//!
//! Databases are in-memory SQLite migrated with the real `Migrator`, so the
//! seed roles, menus and permissions are always present.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use tower::util::ServiceExt;

use eduadmin::endpoints::create_router;
use eduadmin::migrations::Migrator;
use eduadmin::models::prelude::*;
use eduadmin::models::MenuType;
use eduadmin::services::security::{create_access_token, hash_password, SecuritySettings};
use eduadmin::state::AppState;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Create an in-memory SQLite database with every migration applied
pub async fn create_test_db() -> DatabaseConnection {
    // Use simple in-memory SQLite - each connection gets its own database
    let db_url = "sqlite::memory:";

    let db = Database::connect(db_url)
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

pub fn test_security() -> SecuritySettings {
    SecuritySettings::for_testing(TEST_JWT_SECRET)
}

pub fn build_test_app_state_with_db(db: DatabaseConnection) -> AppState {
    AppState::new(db, test_security())
}

/// Fresh app state plus the router built on it
pub async fn test_app() -> (AppState, Router) {
    let state = build_test_app_state_with_db(create_test_db().await);
    let app = create_router(state.clone());
    (state, app)
}

/// Create an active test user without any role
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> user::Model {
    let now = chrono::Utc::now();

    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        full_name: Set(None),
        hashed_password: Set(hash_password("password123", 4).unwrap()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(None),
        updated_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn find_role(db: &DatabaseConnection, role_name: &str) -> role::Model {
    Role::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await
        .unwrap()
        .expect("Role not found")
}

pub async fn assign_role(db: &DatabaseConnection, user_id: i64, role_id: i64) {
    user_role::ActiveModel {
        user_id: Set(user_id),
        role_id: Set(role_id),
        is_active: Set(true),
        assigned_at: Set(chrono::Utc::now()),
        assigned_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

/// Create a test user holding one of the seeded roles
pub async fn create_test_user_with_role(
    db: &DatabaseConnection,
    username: &str,
    role_name: &str,
) -> user::Model {
    let user = create_test_user(db, username).await;
    let role = find_role(db, role_name).await;
    assign_role(db, user.id, role.id).await;
    user
}

/// Create a custom role without menus or grants
pub async fn create_test_role(db: &DatabaseConnection, name: &str) -> role::Model {
    let now = chrono::Utc::now();
    role::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        is_active: Set(true),
        system_role: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(None),
        updated_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn create_test_menu(
    db: &DatabaseConnection,
    name: &str,
    parent_id: Option<i64>,
    sort_order: i32,
) -> menu::Model {
    let now = chrono::Utc::now();
    menu::ActiveModel {
        name: Set(name.to_string()),
        display_name: Set(name.to_string()),
        description: Set(None),
        icon: Set(None),
        route: Set(None),
        menu_type: Set(MenuType::Admin),
        parent_id: Set(parent_id),
        sort_order: Set(sort_order),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(None),
        updated_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn find_menu(db: &DatabaseConnection, name: &str) -> menu::Model {
    Menu::find()
        .filter(menu::Column::Name.eq(name))
        .one(db)
        .await
        .unwrap()
        .expect("Menu not found")
}

pub async fn find_permission(db: &DatabaseConnection, key: &str) -> permission::Model {
    Permission::find()
        .filter(permission::Column::Key.eq(key))
        .one(db)
        .await
        .unwrap()
        .expect("Permission not found")
}

pub async fn grant(db: &DatabaseConnection, role_id: i64, permission_id: i64, is_granted: bool) {
    let now = chrono::Utc::now();
    role_permission::ActiveModel {
        role_id: Set(role_id),
        permission_id: Set(permission_id),
        is_granted: Set(is_granted),
        granted_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

/// Bearer token for a user, signed with the test secret
pub fn token_for(user_id: i64) -> String {
    create_access_token(&test_security(), user_id).unwrap()
}

/// Send a request and return (status, parsed JSON body)
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, json)
}

/// Make an authenticated GET request and return (status, body).
pub async fn authenticated_get(
    app: Router,
    uri: &str,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, Some(token), None).await
}

/// Make an authenticated POST request and return (status, body).
pub async fn authenticated_post(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(token), Some(body)).await
}

/// Make an authenticated PUT request and return (status, body).
pub async fn authenticated_put(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, Some(token), Some(body)).await
}

/// Make an authenticated DELETE request and return (status, body).
pub async fn authenticated_delete(
    app: Router,
    uri: &str,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, Some(token), None).await
}
