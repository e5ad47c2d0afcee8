//! Resolution of a user's effective permissions and visible menus.
//!
//! Only active assignments to active roles count. A user without any such
//! assignment resolves to an empty set.

use std::collections::BTreeSet;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::error::Result;
use crate::models::prelude::*;
use crate::models::{permission, MenuType};
use crate::services::menu_tree::{build_menu_tree, MenuNode};

/// Ids of the active roles actively assigned to a user
pub async fn active_role_ids<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<i64>> {
    let assignments = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::IsActive.eq(true))
        .find_also_related(Role)
        .all(db)
        .await?;

    Ok(assignments
        .into_iter()
        .filter_map(|(_, role)| role.filter(|r| r.is_active).map(|r| r.id))
        .collect())
}

/// Union of the permission keys granted to a user through its roles
pub async fn resolve_user_permissions<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<BTreeSet<String>> {
    let role_ids = active_role_ids(db, user_id).await?;
    if role_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let grants = RolePermission::find()
        .filter(role_permission::Column::RoleId.is_in(role_ids))
        .find_also_related(Permission)
        .all(db)
        .await?;

    Ok(effective_permission_keys(grants))
}

/// Keys of active permissions behind grants that are not revoked
pub fn effective_permission_keys<I>(grants: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = (role_permission::Model, Option<permission::Model>)>,
{
    grants
        .into_iter()
        .filter(|(grant, _)| grant.is_granted)
        .filter_map(|(_, perm)| perm)
        .filter(|perm| perm.is_active)
        .map(|perm| perm.key)
        .collect()
}

/// Menu forest visible to a user, optionally restricted to one menu type
pub async fn resolve_user_menus<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    menu_type: Option<MenuType>,
) -> Result<Vec<MenuNode>> {
    let role_ids = active_role_ids(db, user_id).await?;
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let visible: BTreeSet<i64> = RoleMenu::find()
        .filter(role_menu::Column::RoleId.is_in(role_ids))
        .filter(role_menu::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|rm| rm.menu_id)
        .collect();
    if visible.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = Menu::find()
        .filter(menu::Column::Id.is_in(visible))
        .filter(menu::Column::IsActive.eq(true));
    if let Some(menu_type) = menu_type {
        query = query.filter(menu::Column::MenuType.eq(menu_type));
    }
    let menus = query
        .order_by_asc(menu::Column::SortOrder)
        .all(db)
        .await?;

    Ok(build_menu_tree(&menus))
}
