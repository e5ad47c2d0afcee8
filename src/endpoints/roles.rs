use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};

use crate::error::Result;
use crate::middleware::{Authorized, RolesCreate, RolesDelete, RolesEdit, RolesView};
use crate::schemas::{
    ApiResponse, DeleteOutcome, DeleteQuery, GrantRequest, GrantResponse, RoleData, RoleListData,
    RoleRequest,
};
use crate::services::roles;
use crate::state::AppState;

/// Create roles routes
pub fn roles_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route(
            "/{id}",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/{id}/permissions/{permission_id}", put(set_role_permission))
        .with_state(state)
}

/// List active roles (requires roles.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/role",
    tag = "Roles",
    responses((status = 200, body = RoleListData))
)]
async fn list_roles(
    State(state): State<AppState>,
    _auth: Authorized<RolesView>,
) -> Result<Json<ApiResponse<RoleListData>>> {
    let roles = roles::list_roles(&state.db)
        .await
        .inspect_err(|e| tracing::warn!(operation = "list_roles", "Role listing failed: {}", e))?;
    Ok(Json(ApiResponse::ok(
        "Roles retrieved successfully",
        RoleListData { roles },
    )))
}

/// Get role by ID (requires roles.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/role/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 200, body = RoleData),
        (status = 404, description = "Role not found or inactive")
    )
)]
async fn get_role(
    State(state): State<AppState>,
    _auth: Authorized<RolesView>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RoleData>>> {
    let role = roles::get_role(&state.db, id).await.inspect_err(|e| {
        tracing::warn!(operation = "get_role", role_id = id, "Role lookup failed: {}", e)
    })?;
    Ok(Json(ApiResponse::ok(
        "Role retrieved successfully",
        RoleData { role },
    )))
}

/// Create a new role (requires roles.create permission)
#[utoipa::path(
    post,
    path = "/api/v1/role",
    tag = "Roles",
    request_body = RoleRequest,
    responses(
        (status = 200, body = RoleData),
        (status = 400, description = "Every violated validation rule")
    )
)]
async fn create_role(
    State(state): State<AppState>,
    auth: Authorized<RolesCreate>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<ApiResponse<RoleData>>> {
    let role = roles::create_role(&state.db, auth.actor(), request)
        .await
        .inspect_err(|e| tracing::warn!(operation = "create_role", "Role create failed: {}", e))?;
    Ok(Json(ApiResponse::ok(
        "Role created successfully",
        RoleData { role },
    )))
}

/// Replace a role and its menu visibility (requires roles.edit permission)
#[utoipa::path(
    put,
    path = "/api/v1/role/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role ID")),
    request_body = RoleRequest,
    responses(
        (status = 200, body = RoleData),
        (status = 400, description = "Every violated validation rule"),
        (status = 404, description = "Role not found")
    )
)]
async fn update_role(
    State(state): State<AppState>,
    auth: Authorized<RolesEdit>,
    Path(id): Path<i64>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<ApiResponse<RoleData>>> {
    let role = roles::update_role(&state.db, auth.actor(), id, request)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "update_role", role_id = id, "Role update failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok(
        "Role updated successfully",
        RoleData { role },
    )))
}

/// Grant or revoke a single permission (requires roles.edit permission)
#[utoipa::path(
    put,
    path = "/api/v1/role/{id}/permissions/{permission_id}",
    tag = "Roles",
    params(
        ("id" = i64, Path, description = "Role ID"),
        ("permission_id" = i64, Path, description = "Permission ID")
    ),
    request_body = GrantRequest,
    responses(
        (status = 200, body = GrantResponse),
        (status = 404, description = "Role or permission not found")
    )
)]
async fn set_role_permission(
    State(state): State<AppState>,
    auth: Authorized<RolesEdit>,
    Path((id, permission_id)): Path<(i64, i64)>,
    Json(request): Json<GrantRequest>,
) -> Result<Json<ApiResponse<GrantResponse>>> {
    let grant = roles::set_grant(
        &state.db,
        auth.actor(),
        id,
        permission_id,
        request.is_granted,
    )
    .await
    .inspect_err(|e| {
        tracing::warn!(
            operation = "set_role_permission",
            role_id = id,
            permission_id,
            "Permission grant failed: {}",
            e
        )
    })?;
    let message = if grant.is_granted {
        "Permission granted"
    } else {
        "Permission revoked"
    };
    Ok(Json(ApiResponse::ok(message, grant)))
}

/// Delete a role (requires roles.delete permission)
#[utoipa::path(
    delete,
    path = "/api/v1/role/{id}",
    tag = "Roles",
    params(("id" = i64, Path, description = "Role ID"), DeleteQuery),
    responses(
        (status = 200, body = DeleteOutcome),
        (status = 400, description = "System role"),
        (status = 404, description = "Role not found or inactive"),
        (status = 409, description = "Role still assigned to users")
    )
)]
async fn delete_role(
    State(state): State<AppState>,
    auth: Authorized<RolesDelete>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<DeleteOutcome>>> {
    let outcome = roles::delete_role(&state.db, auth.actor(), id, query.force_delete)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "delete_role", role_id = id, "Role delete failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok("Role deleted successfully", outcome)))
}
