//! Application bootstrapper
//!
//! Handles all initialization and setup for the admin API.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use axum::Router;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::auth::{BootstrapAdmin, DEV_JWT_SECRET};
use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::models::prelude::*;
use crate::models::{role, user, user_role, SystemRole};
use crate::services::security::{hash_password, SecuritySettings};
use crate::state::{AppState, DbConn};

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting EduAdmin API v{}", CONFIG.version);

    let state = init_services().await?;
    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("eduadmin={},tower_http=info", CONFIG.log_level).into()
    });

    if CONFIG.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }
}

/// Initialize all application services
async fn init_services() -> anyhow::Result<AppState> {
    if CONFIG.auth.jwt_secret == DEV_JWT_SECRET {
        tracing::warn!("EDUADMIN_JWT_SECRET is not set, using the development secret");
    }

    let conn = db::connect().await?;
    let security = CONFIG.auth.security_settings();

    if let Some(admin) = CONFIG.auth.bootstrap_admin.as_ref() {
        ensure_initial_admin(&conn, admin, &security).await?;
    }

    Ok(AppState::new(conn, security))
}

/// Create the first SuperAdmin account when the users table is empty
pub async fn ensure_initial_admin(
    db: &DbConn,
    admin: &BootstrapAdmin,
    security: &SecuritySettings,
) -> crate::error::Result<Option<user::Model>> {
    if User::find().count(db).await? > 0 {
        return Ok(None);
    }

    let super_admin = Role::find()
        .filter(role::Column::SystemRole.eq(SystemRole::SuperAdmin))
        .one(db)
        .await?
        .ok_or_else(|| {
            crate::error::AppError::Internal("SuperAdmin role has not been seeded".to_string())
        })?;

    let now = chrono::Utc::now();
    let created = user::ActiveModel {
        username: Set(admin.username.clone()),
        email: Set(admin.email.clone()),
        full_name: Set(None),
        hashed_password: Set(hash_password(&admin.password, security.bcrypt_cost)?),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(None),
        updated_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    user_role::ActiveModel {
        user_id: Set(created.id),
        role_id: Set(super_admin.id),
        is_active: Set(true),
        assigned_at: Set(now),
        assigned_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        user_id = created.id,
        username = %created.username,
        "Created initial administrator"
    );
    Ok(Some(created))
}

/// Create the main application router with middleware
pub fn create_app(state: AppState) -> Router {
    let cors = if CONFIG.server.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = CONFIG
            .server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
