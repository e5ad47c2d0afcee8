use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::default_true;

use crate::models::MenuType;
use crate::services::menu_tree::MenuNode;
use crate::services::validation::validate_identifier;

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    #[validate(
        length(min = 2, max = 100, message = "Menu name must be between 2 and 100 characters"),
        custom(function = "validate_identifier")
    )]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Display name must be between 1 and 100 characters"))]
    pub display_name: String,
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Menu icon too long"))]
    pub icon: Option<String>,
    #[validate(length(max = 255, message = "Route must be at most 255 characters"))]
    pub route: Option<String>,
    pub menu_type: MenuType,
    pub parent_id: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100000, message = "Sort order must be between 0 and 100000"))]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MenuListQuery {
    pub menu_type: Option<MenuType>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserMenuQuery {
    pub menu_type: Option<MenuType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuListData {
    pub menus: Vec<MenuNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuData {
    pub menu: MenuNode,
}
