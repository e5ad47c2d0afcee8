use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::default_true;

use crate::models::{menu, role, SystemRole};

/// Body of role create and update. On update `menuIds` replaces every
/// visibility record; `permissionIds` replaces the grants only when present.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    #[validate(length(min = 2, max = 50, message = "Role name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub menu_ids: Vec<i64>,
    pub permission_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub is_granted: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    pub role_id: i64,
    pub permission_id: i64,
    pub permission_key: String,
    pub is_granted: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuSummary {
    pub id: i64,
    pub name: String,
    pub display_name: String,
}

impl From<menu::Model> for MenuSummary {
    fn from(menu: menu::Model) -> Self {
        Self {
            id: menu.id,
            name: menu.name,
            display_name: menu.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub system_role: Option<SystemRole>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    /// Menus with an active visibility record, in menu order
    pub menus: Vec<MenuSummary>,
    /// Keys of the granted permissions, sorted
    pub permissions: Vec<String>,
    /// Number of users actively assigned
    pub user_count: u64,
}

impl RoleResponse {
    pub fn from_parts(
        role: role::Model,
        menus: Vec<menu::Model>,
        permissions: Vec<String>,
        user_count: u64,
    ) -> Self {
        Self {
            id: role.id,
            is_system: role.is_system(),
            name: role.name,
            description: role.description,
            is_active: role.is_active,
            system_role: role.system_role,
            created_at: role.created_at,
            updated_at: role.updated_at,
            created_by: role.created_by,
            updated_by: role.updated_by,
            menus: menus.into_iter().map(MenuSummary::from).collect(),
            permissions,
            user_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RoleListData {
    pub roles: Vec<RoleResponse>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RoleData {
    pub role: RoleResponse,
}
