use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::default_true;

use crate::models::{menu, permission, PermissionType};
use crate::services::permission_tree::PermissionTreeNode;
use crate::services::validation::validate_permission_key;

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    #[validate(
        length(min = 3, max = 100, message = "Permission key must be between 3 and 100 characters"),
        custom(function = "validate_permission_key")
    )]
    pub key: String,
    #[validate(length(min = 1, max = 100, message = "Display name must be between 1 and 100 characters"))]
    pub display_name: String,
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
    pub permission_type: PermissionType,
    pub menu_id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub id: i64,
    pub key: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permission_type: PermissionType,
    pub menu_id: i64,
    pub menu_name: Option<String>,
    pub is_active: bool,
    pub is_system_permission: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionResponse {
    pub fn from_permission(perm: permission::Model, menu: Option<menu::Model>) -> Self {
        Self {
            id: perm.id,
            key: perm.key,
            display_name: perm.display_name,
            description: perm.description,
            permission_type: perm.permission_type,
            menu_id: perm.menu_id,
            menu_name: menu.map(|m| m.display_name),
            is_active: perm.is_active,
            is_system_permission: perm.is_system_permission,
            created_at: perm.created_at,
            updated_at: perm.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTreeData {
    pub permission_tree: Vec<PermissionTreeNode>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PermissionData {
    pub permission: PermissionResponse,
}
