//! Menu management. Reads return trees built by [`build_menu_tree`]; writes
//! enforce parent integrity through [`ensure_valid_parent`].

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::models::MenuType;
use crate::schemas::{DeleteOutcome, MenuListQuery, MenuRequest};
use crate::services::menu_tree::{
    build_menu_tree, descendant_ids, ensure_valid_parent, find_node, MenuNode,
};
use crate::services::validation::Violations;
use crate::services::Actor;
use crate::state::DbConn;

/// Ids from `ids` that are not active menus
pub async fn missing_active_menus<C: ConnectionTrait>(
    db: &C,
    ids: &BTreeSet<i64>,
) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: BTreeSet<i64> = Menu::find()
        .filter(menu::Column::Id.is_in(ids.iter().copied()))
        .filter(menu::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    Ok(ids.difference(&found).copied().collect())
}

async fn parent_links<C: ConnectionTrait>(db: &C) -> Result<Vec<(i64, Option<i64>)>> {
    Ok(Menu::find()
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m.parent_id))
        .collect())
}

/// Active direct children and active role-menu rows of a menu
async fn active_dependents<C: ConnectionTrait>(db: &C, menu_id: i64) -> Result<(u64, u64)> {
    let children = Menu::find()
        .filter(menu::Column::ParentId.eq(menu_id))
        .filter(menu::Column::IsActive.eq(true))
        .count(db)
        .await?;
    let roles = RoleMenu::find()
        .filter(role_menu::Column::MenuId.eq(menu_id))
        .filter(role_menu::Column::IsActive.eq(true))
        .count(db)
        .await?;
    Ok((children, roles))
}

pub async fn list_menus(db: &DbConn, query: &MenuListQuery) -> Result<Vec<MenuNode>> {
    let mut select = Menu::find();
    if let Some(menu_type) = query.menu_type {
        select = select.filter(menu::Column::MenuType.eq(menu_type));
    }
    if !query.include_inactive {
        select = select.filter(menu::Column::IsActive.eq(true));
    }
    let menus = select.order_by_asc(menu::Column::SortOrder).all(db).await?;

    Ok(build_menu_tree(&menus))
}

/// An active menu with its active subtree
pub async fn get_menu(db: &DbConn, menu_id: i64) -> Result<MenuNode> {
    let found = Menu::find_by_id(menu_id)
        .filter(menu::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu not found".to_string()))?;

    subtree(db, &found).await
}

async fn subtree(db: &DbConn, root: &menu::Model) -> Result<MenuNode> {
    let same_type = Menu::find()
        .filter(menu::Column::MenuType.eq(root.menu_type))
        .filter(menu::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let forest = build_menu_tree(&same_type);

    Ok(find_node(&forest, root.id)
        .cloned()
        .unwrap_or_else(|| MenuNode::from(root)))
}

async fn validate_menu_request(
    db: &DbConn,
    req: &MenuRequest,
    existing: Option<&menu::Model>,
) -> Result<()> {
    let mut violations = Violations::of(req);
    let name = req.name.trim();

    let mut same_name = Menu::find().filter(menu::Column::Name.eq(name));
    if let Some(current) = existing {
        same_name = same_name.filter(menu::Column::Id.ne(current.id));
    }
    violations.check(
        same_name.one(db).await?.is_some(),
        format!("Menu name '{}' already exists", name),
    );

    if let Some(parent_id) = req.parent_id {
        let is_self = existing.is_some_and(|m| m.id == parent_id);
        match Menu::find_by_id(parent_id).one(db).await? {
            _ if is_self => {}
            None => violations.push(format!("Parent menu {} does not exist", parent_id)),
            Some(parent) => {
                violations.check(
                    !parent.is_active,
                    format!("Parent menu {} is inactive", parent_id),
                );
                violations.check(
                    parent.menu_type != req.menu_type,
                    "Parent menu must have the same menu type",
                );
            }
        }
    }

    if let Some(current) = existing {
        let links = parent_links(db).await?;
        if let Err(e) = ensure_valid_parent(current.id, req.parent_id, &links) {
            violations.push(e.to_string());
        }

        if current.menu_type != req.menu_type {
            let children = Menu::find()
                .filter(menu::Column::ParentId.eq(current.id))
                .count(db)
                .await?;
            violations.check(
                children > 0,
                format!(
                    "Menu type cannot change while the menu has {} child menu(s)",
                    children
                ),
            );
        }
    }

    violations.into_result()
}

pub async fn create_menu(db: &DbConn, actor: Actor, req: MenuRequest) -> Result<MenuNode> {
    validate_menu_request(db, &req, None).await?;

    let now = Utc::now();
    let created = menu::ActiveModel {
        name: Set(req.name.trim().to_string()),
        display_name: Set(req.display_name),
        description: Set(req.description),
        icon: Set(req.icon),
        route: Set(req.route),
        menu_type: Set(req.menu_type),
        parent_id: Set(req.parent_id),
        sort_order: Set(req.sort_order),
        is_active: Set(req.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.audit_id()),
        updated_by: Set(actor.audit_id()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(menu_id = created.id, actor = actor.user_id, "Menu created");
    Ok(MenuNode::from(&created))
}

pub async fn update_menu(
    db: &DbConn,
    actor: Actor,
    menu_id: i64,
    req: MenuRequest,
) -> Result<MenuNode> {
    let existing = Menu::find_by_id(menu_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Menu not found".to_string()))?;

    validate_menu_request(db, &req, Some(&existing)).await?;

    if existing.is_active && !req.is_active {
        let (children, roles) = active_dependents(db, menu_id).await?;
        if children > 0 || roles > 0 {
            return Err(AppError::Conflict(format!(
                "Menu has {} active child menu(s) and is visible to {} role(s). Use DELETE with forceDelete=true to deactivate it",
                children, roles
            )));
        }
    }

    let mut model: menu::ActiveModel = existing.into();
    model.name = Set(req.name.trim().to_string());
    model.display_name = Set(req.display_name);
    model.description = Set(req.description);
    model.icon = Set(req.icon);
    model.route = Set(req.route);
    model.menu_type = Set(req.menu_type);
    model.parent_id = Set(req.parent_id);
    model.sort_order = Set(req.sort_order);
    model.is_active = Set(req.is_active);
    model.updated_at = Set(Utc::now());
    model.updated_by = Set(actor.audit_id());
    let updated = model.update(db).await?;

    tracing::info!(menu_id, actor = actor.user_id, "Menu updated");
    if updated.is_active {
        subtree(db, &updated).await
    } else {
        Ok(MenuNode::from(&updated))
    }
}

/// Soft-delete a menu. Missing or already inactive menus succeed without
/// changes. Active children or role visibility block the delete unless
/// `force` is set; the forced cascade is best effort and reports failures as
/// warnings.
pub async fn delete_menu(
    db: &DbConn,
    actor: Actor,
    menu_id: i64,
    force: bool,
) -> Result<Option<DeleteOutcome>> {
    let Some(existing) = Menu::find_by_id(menu_id)
        .filter(menu::Column::IsActive.eq(true))
        .one(db)
        .await?
    else {
        tracing::debug!(menu_id, "Menu missing or already inactive, nothing to delete");
        return Ok(None);
    };

    let all_menus = Menu::find().all(db).await?;
    let links: Vec<(i64, Option<i64>)> = all_menus.iter().map(|m| (m.id, m.parent_id)).collect();
    let descendants = descendant_ids(menu_id, &links);
    let active_descendants: Vec<i64> = all_menus
        .iter()
        .filter(|m| m.is_active && descendants.contains(&m.id))
        .map(|m| m.id)
        .collect();

    let mut affected_menu_ids: Vec<i64> = active_descendants.clone();
    affected_menu_ids.push(menu_id);
    let visible_to: BTreeSet<i64> = RoleMenu::find()
        .filter(role_menu::Column::MenuId.is_in(affected_menu_ids.iter().copied()))
        .filter(role_menu::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|rm| rm.role_id)
        .collect();
    let (active_children, direct_roles) = active_dependents(db, menu_id).await?;

    if (active_children > 0 || direct_roles > 0) && !force {
        return Err(AppError::Conflict(format!(
            "Menu has {} active child menu(s) and is visible to {} role(s). Use forceDelete=true to deactivate the children and remove the role assignments",
            active_children, direct_roles
        )));
    }

    let now = Utc::now();
    let mut model: menu::ActiveModel = existing.into();
    model.is_active = Set(false);
    model.updated_at = Set(now);
    model.updated_by = Set(actor.audit_id());
    model.update(db).await?;

    let mut outcome = DeleteOutcome::default();
    if force {
        let mut deactivated = 0u64;
        for descendant in all_menus.into_iter().filter(|m| active_descendants.contains(&m.id)) {
            let descendant_id = descendant.id;
            let mut model: menu::ActiveModel = descendant.into();
            model.is_active = Set(false);
            model.updated_at = Set(now);
            model.updated_by = Set(actor.audit_id());
            match model.update(db).await {
                Ok(_) => deactivated += 1,
                Err(e) => {
                    tracing::warn!(
                        menu_id = descendant_id,
                        "Failed to deactivate child menu: {}",
                        e
                    );
                    outcome
                        .warnings
                        .push(format!("Failed to deactivate child menu {}: {}", descendant_id, e));
                }
            }
        }

        for &affected in &affected_menu_ids {
            if let Err(e) = RoleMenu::delete_many()
                .filter(role_menu::Column::MenuId.eq(affected))
                .exec(db)
                .await
            {
                tracing::warn!(menu_id = affected, "Failed to remove role menus: {}", e);
                outcome
                    .warnings
                    .push(format!("Failed to remove role assignments of menu {}: {}", affected, e));
            }
        }

        outcome.affected_children_count = Some(deactivated);
        outcome.affected_role_count = Some(visible_to.len() as u64);
    } else {
        outcome.affected_children_count = Some(0);
        outcome.affected_role_count = Some(0);
    }

    tracing::info!(menu_id, force, actor = actor.user_id, "Menu deleted");
    Ok(Some(outcome))
}

/// Menu forest visible to a user through its roles
pub async fn user_menus(
    db: &DbConn,
    user_id: i64,
    menu_type: Option<MenuType>,
) -> Result<Vec<MenuNode>> {
    crate::services::authorization::resolve_user_menus(db, user_id, menu_type).await
}
