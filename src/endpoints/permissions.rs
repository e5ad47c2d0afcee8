use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::{
    Authorized, PermissionsCreate, PermissionsDelete, PermissionsEdit, PermissionsView,
};
use crate::schemas::{
    ApiResponse, DeleteOutcome, DeleteQuery, PermissionData, PermissionRequest, PermissionTreeData,
};
use crate::services::permissions;
use crate::state::AppState;

/// Create permissions routes
pub fn permissions_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_permission_tree).post(create_permission))
        .route(
            "/{id}",
            get(get_permission)
                .put(update_permission)
                .delete(delete_permission),
        )
        .with_state(state)
}

/// Permissions grouped by menu and type (requires permissions.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/permission",
    tag = "Permissions",
    responses((status = 200, description = "Menu > permission type > permission tree"))
)]
async fn get_permission_tree(
    State(state): State<AppState>,
    _auth: Authorized<PermissionsView>,
) -> Result<Json<ApiResponse<PermissionTreeData>>> {
    let permission_tree = permissions::permission_tree(&state.db)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "permission_tree", "Permission tree failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok(
        "Permission tree retrieved successfully",
        PermissionTreeData { permission_tree },
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/permission/{id}",
    tag = "Permissions",
    params(("id" = i64, Path, description = "Permission ID")),
    responses(
        (status = 200, body = PermissionData),
        (status = 404, description = "Permission not found")
    )
)]
async fn get_permission(
    State(state): State<AppState>,
    _auth: Authorized<PermissionsView>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PermissionData>>> {
    let permission = permissions::get_permission(&state.db, id)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                operation = "get_permission",
                permission_id = id,
                "Permission lookup failed: {}",
                e
            )
        })?;
    Ok(Json(ApiResponse::ok(
        "Permission retrieved successfully",
        PermissionData { permission },
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/permission",
    tag = "Permissions",
    request_body = PermissionRequest,
    responses(
        (status = 200, body = PermissionData),
        (status = 400, description = "Every violated validation rule")
    )
)]
async fn create_permission(
    State(state): State<AppState>,
    auth: Authorized<PermissionsCreate>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<ApiResponse<PermissionData>>> {
    let permission = permissions::create_permission(&state.db, auth.actor(), request)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "create_permission", "Permission create failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok(
        "Permission created successfully",
        PermissionData { permission },
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/permission/{id}",
    tag = "Permissions",
    params(("id" = i64, Path, description = "Permission ID")),
    request_body = PermissionRequest,
    responses(
        (status = 200, body = PermissionData),
        (status = 400, description = "Every violated validation rule"),
        (status = 404, description = "Permission not found")
    )
)]
async fn update_permission(
    State(state): State<AppState>,
    auth: Authorized<PermissionsEdit>,
    Path(id): Path<i64>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<ApiResponse<PermissionData>>> {
    let permission = permissions::update_permission(&state.db, auth.actor(), id, request)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                operation = "update_permission",
                permission_id = id,
                "Permission update failed: {}",
                e
            )
        })?;
    Ok(Json(ApiResponse::ok(
        "Permission updated successfully",
        PermissionData { permission },
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/permission/{id}",
    tag = "Permissions",
    params(("id" = i64, Path, description = "Permission ID"), DeleteQuery),
    responses(
        (status = 200, body = DeleteOutcome),
        (status = 400, description = "System permission"),
        (status = 409, description = "Permission still granted to roles")
    )
)]
async fn delete_permission(
    State(state): State<AppState>,
    auth: Authorized<PermissionsDelete>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<DeleteOutcome>>> {
    let outcome = permissions::delete_permission(&state.db, auth.actor(), id, query.force_delete)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                operation = "delete_permission",
                permission_id = id,
                "Permission delete failed: {}",
                e
            )
        })?;
    Ok(Json(ApiResponse::ok("Permission deleted successfully", outcome)))
}
