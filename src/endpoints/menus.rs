use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::middleware::{
    Authenticated, Authorized, MenusCreate, MenusDelete, MenusEdit, MenusView,
};
use crate::schemas::{
    ApiResponse, DeleteOutcome, DeleteQuery, MenuData, MenuListData, MenuListQuery, MenuRequest,
    UserMenuQuery,
};
use crate::services::menus;
use crate::state::AppState;

/// Create menus routes
pub fn menus_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_menus).post(create_menu))
        .route("/user-menus", get(get_user_menus))
        .route(
            "/{id}",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .with_state(state)
}

/// Menu forest (requires menus.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/menu",
    tag = "Menus",
    params(MenuListQuery),
    responses((status = 200, description = "Menu forest ordered by sort order and display name"))
)]
async fn list_menus(
    State(state): State<AppState>,
    _auth: Authorized<MenusView>,
    Query(query): Query<MenuListQuery>,
) -> Result<Json<ApiResponse<MenuListData>>> {
    let menus = menus::list_menus(&state.db, &query)
        .await
        .inspect_err(|e| tracing::warn!(operation = "list_menus", "Menu listing failed: {}", e))?;
    Ok(Json(ApiResponse::ok(
        "Menus retrieved successfully",
        MenuListData { menus },
    )))
}

/// Menus visible to the caller through its roles
#[utoipa::path(
    get,
    path = "/api/v1/menu/user-menus",
    tag = "Menus",
    params(UserMenuQuery),
    responses((status = 200, description = "Menu forest visible to the caller"))
)]
async fn get_user_menus(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<UserMenuQuery>,
) -> Result<Json<ApiResponse<MenuListData>>> {
    let menus = menus::user_menus(&state.db, auth.user_id(), query.menu_type)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                operation = "user_menus",
                user_id = auth.user_id(),
                "User menu resolution failed: {}",
                e
            )
        })?;
    Ok(Json(ApiResponse::ok(
        "User menus retrieved successfully",
        MenuListData { menus },
    )))
}

/// Menu with its subtree (requires menus.view permission)
#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}",
    tag = "Menus",
    params(("id" = i64, Path, description = "Menu ID")),
    responses(
        (status = 200, description = "Menu with its active subtree"),
        (status = 404, description = "Menu not found or inactive")
    )
)]
async fn get_menu(
    State(state): State<AppState>,
    _auth: Authorized<MenusView>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MenuData>>> {
    let menu = menus::get_menu(&state.db, id).await.inspect_err(|e| {
        tracing::warn!(operation = "get_menu", menu_id = id, "Menu lookup failed: {}", e)
    })?;
    Ok(Json(ApiResponse::ok(
        "Menu retrieved successfully",
        MenuData { menu },
    )))
}

/// Create a menu (requires menus.create permission)
#[utoipa::path(
    post,
    path = "/api/v1/menu",
    tag = "Menus",
    request_body = MenuRequest,
    responses(
        (status = 200, description = "Created menu"),
        (status = 400, description = "Every violated validation rule")
    )
)]
async fn create_menu(
    State(state): State<AppState>,
    auth: Authorized<MenusCreate>,
    Json(request): Json<MenuRequest>,
) -> Result<Json<ApiResponse<MenuData>>> {
    let menu = menus::create_menu(&state.db, auth.actor(), request)
        .await
        .inspect_err(|e| tracing::warn!(operation = "create_menu", "Menu create failed: {}", e))?;
    Ok(Json(ApiResponse::ok(
        "Menu created successfully",
        MenuData { menu },
    )))
}

/// Replace a menu (requires menus.edit permission)
#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}",
    tag = "Menus",
    params(("id" = i64, Path, description = "Menu ID")),
    request_body = MenuRequest,
    responses(
        (status = 200, description = "Updated menu with its subtree"),
        (status = 400, description = "Every violated validation rule"),
        (status = 404, description = "Menu not found")
    )
)]
async fn update_menu(
    State(state): State<AppState>,
    auth: Authorized<MenusEdit>,
    Path(id): Path<i64>,
    Json(request): Json<MenuRequest>,
) -> Result<Json<ApiResponse<MenuData>>> {
    let menu = menus::update_menu(&state.db, auth.actor(), id, request)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "update_menu", menu_id = id, "Menu update failed: {}", e)
        })?;
    Ok(Json(ApiResponse::ok(
        "Menu updated successfully",
        MenuData { menu },
    )))
}

/// Soft-delete a menu (requires menus.delete permission)
#[utoipa::path(
    delete,
    path = "/api/v1/menu/{id}",
    tag = "Menus",
    params(("id" = i64, Path, description = "Menu ID"), DeleteQuery),
    responses(
        (status = 200, body = DeleteOutcome),
        (status = 409, description = "Menu has active children or role visibility")
    )
)]
async fn delete_menu(
    State(state): State<AppState>,
    auth: Authorized<MenusDelete>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<DeleteOutcome>>> {
    let outcome = menus::delete_menu(&state.db, auth.actor(), id, query.force_delete)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "delete_menu", menu_id = id, "Menu delete failed: {}", e)
        })?;

    Ok(Json(match outcome {
        Some(outcome) => ApiResponse::ok("Menu deleted successfully", outcome),
        None => ApiResponse::ok("Menu already deleted", DeleteOutcome::default()),
    }))
}
