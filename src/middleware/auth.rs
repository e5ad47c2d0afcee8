//! Authentication middleware for API routes
//!
//! Requires a valid Bearer token for every route it wraps except the health
//! check, and resolves the caller's permission set once per request.

use std::collections::BTreeSet;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::models::prelude::*;
use crate::models::user;
use crate::services::authorization::resolve_user_permissions;
use crate::services::security::decode_token;
use crate::state::AppState;

/// Authenticated user stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: user::Model,
    pub permissions: BTreeSet<String>,
}

impl AuthenticatedUser {
    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }
}

/// Auth middleware that validates Bearer tokens
///
/// Returns 401 Unauthorized if the token is missing or invalid, or if the
/// user no longer exists or is inactive.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.uri().path() == "/api/health" {
        return next.run(req).await;
    }

    let token = match extract_bearer_token(&req) {
        Some(t) => t,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let auth_user = match authenticate(&state, &token).await {
        Ok(u) => u,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    tracing::debug!(
        user_id = auth_user.user.id,
        permissions = auth_user.permissions.len(),
        "Request authenticated"
    );
    req.extensions_mut().insert(auth_user);

    next.run(req).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.to_string())
}

/// Validate the token, load the active user and its effective permissions
async fn authenticate(state: &AppState, token: &str) -> Result<AuthenticatedUser, String> {
    let claims = decode_token(&state.security, token)
        .map_err(|_| "Invalid or expired token".to_string())?;

    if claims.token_type.as_deref() == Some("refresh") {
        return Err("Refresh tokens cannot be used for API access".to_string());
    }

    let user_id = claims
        .user_id()
        .map_err(|_| "Invalid token subject".to_string())?;

    let found_user = User::find_by_id(user_id)
        .filter(user::Column::IsActive.eq(true))
        .one(&state.db)
        .await
        .map_err(|e| {
            tracing::error!(user_id, "Failed to load user for token: {}", e);
            "Unable to verify credentials".to_string()
        })?
        .ok_or_else(|| "User not found or inactive".to_string())?;

    let permissions = resolve_user_permissions(&state.db, found_user.id)
        .await
        .map_err(|e| {
            tracing::error!(user_id, "Failed to resolve permissions: {}", e);
            "Unable to verify credentials".to_string()
        })?;

    Ok(AuthenticatedUser {
        user: found_user,
        permissions,
    })
}

/// Create a 401 Unauthorized JSON response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "success": false,
            "message": message
        })),
    )
        .into_response()
}
