pub mod menus;
pub mod permissions;
pub mod roles;
pub mod users;

use axum::{middleware as axum_middleware, routing::get, Json, Router};

use crate::config::CONFIG;
use crate::middleware::require_auth;
use crate::schemas::{ApiResponse, VersionInfo};
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/v1/system/version", get(get_version));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(protected_routes)
}

/// API routes under /api/v1/* (protected by auth middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest("/user", users::users_routes(state.clone()))
        .nest("/role", roles::roles_routes(state.clone()))
        .nest("/menu", menus::menus_routes(state.clone()))
        .nest("/permission", permissions::permissions_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
#[utoipa::path(
    get,
    path = "/api/v1/system/version",
    tag = "System",
    responses(
        (status = 200, description = "Service name and version")
    )
)]
async fn get_version() -> Json<ApiResponse<VersionInfo>> {
    Json(ApiResponse::ok(
        "Version retrieved",
        VersionInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: CONFIG.version.clone(),
        },
    ))
}
