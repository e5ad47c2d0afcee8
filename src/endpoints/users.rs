use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::{
    Authenticated, Authorized, UsersCreate, UsersDelete, UsersEdit, UsersView,
};
use crate::schemas::{
    ApiResponse, CreateUserRequest, PermissionKeysData, UpdateUserRequest, UserData,
    UserListData,
};
use crate::services::{authorization, users};
use crate::state::AppState;

/// Create users routes
pub fn users_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me/permissions", get(get_my_permissions))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/permissions", get(get_user_permissions))
        .with_state(state)
}

/// List all users (requires users.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/user",
    tag = "Users",
    responses((status = 200, description = "All users with their active roles"))
)]
async fn list_users(
    State(state): State<AppState>,
    _auth: Authorized<UsersView>,
) -> Result<Json<ApiResponse<UserListData>>> {
    let users = users::list_users(&state.db)
        .await
        .inspect_err(|e| tracing::warn!(operation = "list_users", "User listing failed: {}", e))?;
    Ok(Json(ApiResponse::ok(
        "Users retrieved successfully",
        UserListData { users },
    )))
}

/// Get user by ID (requires users.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with its active roles"),
        (status = 404, description = "User not found")
    )
)]
async fn get_user(
    State(state): State<AppState>,
    _auth: Authorized<UsersView>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserData>>> {
    let user = users::get_user(&state.db, id).await.inspect_err(|e| {
        tracing::warn!(operation = "get_user", user_id = id, "User lookup failed: {}", e)
    })?;
    Ok(Json(ApiResponse::ok(
        "User retrieved successfully",
        UserData { user },
    )))
}

/// Effective permissions of any user (requires users.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/user/{id}/permissions",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, body = PermissionKeysData))
)]
async fn get_user_permissions(
    State(state): State<AppState>,
    _auth: Authorized<UsersView>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PermissionKeysData>>> {
    let permissions = users::user_permissions(&state.db, id)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                operation = "user_permissions",
                user_id = id,
                "Permission resolution failed: {}",
                e
            )
        })?;
    Ok(Json(ApiResponse::ok(
        "Permissions retrieved successfully",
        PermissionKeysData { permissions },
    )))
}

/// Effective permissions of the caller
#[utoipa::path(
    get,
    path = "/api/v1/user/me/permissions",
    tag = "Users",
    responses((status = 200, body = PermissionKeysData))
)]
async fn get_my_permissions(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<PermissionKeysData>>> {
    let permissions = authorization::resolve_user_permissions(&state.db, auth.user_id())
        .await
        .inspect_err(|e| {
            tracing::warn!(
                operation = "my_permissions",
                user_id = auth.user_id(),
                "Permission resolution failed: {}",
                e
            )
        })?
        .into_iter()
        .collect();
    Ok(Json(ApiResponse::ok(
        "Permissions retrieved successfully",
        PermissionKeysData { permissions },
    )))
}

/// Create a new user (requires users.create permission)
#[utoipa::path(
    post,
    path = "/api/v1/user",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created user"),
        (status = 400, description = "Every violated validation rule")
    )
)]
async fn create_user(
    State(state): State<AppState>,
    auth: Authorized<UsersCreate>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserData>>> {
    let user = users::create_user(&state.db, &state.security, auth.actor(), request)
        .await
        .inspect_err(|e| tracing::warn!(operation = "create_user", "User create failed: {}", e))?;
    Ok(Json(ApiResponse::ok(
        "User created successfully",
        UserData { user },
    )))
}

/// Replace a user (requires users.edit permission)
#[utoipa::path(
    put,
    path = "/api/v1/user/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user"),
        (status = 400, description = "Every violated validation rule"),
        (status = 404, description = "User not found")
    )
)]
async fn update_user(
    State(state): State<AppState>,
    auth: Authorized<UsersEdit>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserData>>> {
    let user = users::update_user(&state.db, &state.security, auth.actor(), id, request)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "update_user", user_id = id, "User update failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok(
        "User updated successfully",
        UserData { user },
    )))
}

/// Soft-delete a user (requires users.delete permission)
#[utoipa::path(
    delete,
    path = "/api/v1/user/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Attempt to delete the caller's own account")
    )
)]
async fn delete_user(
    State(state): State<AppState>,
    auth: Authorized<UsersDelete>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    users::delete_user(&state.db, auth.actor(), id)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "delete_user", user_id = id, "User delete failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok("User deleted successfully", ())))
}
