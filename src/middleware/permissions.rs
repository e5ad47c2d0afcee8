//! Permission system with type-safe authorization extractors
//!
//! Usage in handlers:
//! ```ignore
//! use crate::middleware::{Authorized, permissions::*};
//!
//! async fn list_users(
//!     auth: Authorized<UsersView>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<ApiResponse<UserListData>>> {
//!     // Permission already verified
//! }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::user;
use crate::services::Actor;

/// Trait for permission marker types
pub trait Permission: Send + Sync + 'static {
    /// The permission key (e.g., "users.view")
    const NAME: &'static str;
}

/// Macro to define permission types
///
/// Creates zero-sized marker types that implement `Permission`
macro_rules! define_permissions {
    ($($(#[$meta:meta])* $name:ident => $perm:expr),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Permission for $name {
                const NAME: &'static str = $perm;
            }
        )*
    };
}

define_permissions! {
    // User management
    /// View users list and details
    UsersView => "users.view",
    UsersCreate => "users.create",
    UsersEdit => "users.edit",
    UsersDelete => "users.delete",

    // Role management
    /// View roles list and details
    RolesView => "roles.view",
    RolesCreate => "roles.create",
    /// Update roles and toggle their permission grants
    RolesEdit => "roles.edit",
    RolesDelete => "roles.delete",

    // Menu management
    MenusView => "menus.view",
    MenusCreate => "menus.create",
    MenusEdit => "menus.edit",
    MenusDelete => "menus.delete",

    // Permission management
    PermissionsView => "permissions.view",
    PermissionsCreate => "permissions.create",
    PermissionsEdit => "permissions.edit",
    PermissionsDelete => "permissions.delete",
}

/// Extractor that requires a specific permission
///
/// This extractor verifies that the authenticated user has the required
/// permission before the handler is called. If the permission check fails,
/// a 403 Forbidden error is returned.
#[derive(Debug, Clone)]
pub struct Authorized<P: Permission>(pub user::Model, PhantomData<P>);

impl<P: Permission> Authorized<P> {
    /// Get the user ID
    pub fn user_id(&self) -> i64 {
        self.0.id
    }

    /// Identity recorded in audit columns of writes made by this request
    pub fn actor(&self) -> Actor {
        Actor::new(self.0.id)
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Permission,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        if !auth_user.has_permission(P::NAME) {
            tracing::debug!(
                user_id = auth_user.user.id,
                permission = P::NAME,
                "Permission denied"
            );
            return Err(AppError::Forbidden(format!(
                "Permission denied: {} required",
                P::NAME
            )));
        }

        Ok(Authorized(auth_user.user.clone(), PhantomData))
    }
}

/// Extractor for any authenticated user (no specific permission required)
#[derive(Debug, Clone)]
pub struct Authenticated(pub user::Model);

impl Authenticated {
    /// Get the user ID
    pub fn user_id(&self) -> i64 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        Ok(Authenticated(auth_user.user.clone()))
    }
}
