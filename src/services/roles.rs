//! Role management: CRUD, menu visibility, permission grants and the
//! force-delete cascade.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::schemas::{DeleteOutcome, GrantResponse, RoleRequest, RoleResponse};
use crate::services::authorization::effective_permission_keys;
use crate::services::menus::missing_active_menus;
use crate::services::permissions::missing_active_permissions;
use crate::services::validation::Violations;
use crate::services::Actor;
use crate::state::DbConn;

/// Project a role with its visible menus, granted keys and user count
pub async fn role_response<C: ConnectionTrait>(
    db: &C,
    found: role::Model,
) -> Result<RoleResponse> {
    let mut menus: Vec<menu::Model> = RoleMenu::find()
        .filter(role_menu::Column::RoleId.eq(found.id))
        .filter(role_menu::Column::IsActive.eq(true))
        .find_also_related(Menu)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, m)| m)
        .filter(|m| m.is_active)
        .collect();
    menus.sort_by(|a, b| (a.sort_order, &a.display_name).cmp(&(b.sort_order, &b.display_name)));

    let grants = RolePermission::find()
        .filter(role_permission::Column::RoleId.eq(found.id))
        .find_also_related(Permission)
        .all(db)
        .await?;
    let permissions = effective_permission_keys(grants).into_iter().collect();

    let user_count = active_assignment_count(db, found.id).await?;

    Ok(RoleResponse::from_parts(found, menus, permissions, user_count))
}

async fn active_assignment_count<C: ConnectionTrait>(db: &C, role_id: i64) -> Result<u64> {
    Ok(UserRole::find()
        .filter(user_role::Column::RoleId.eq(role_id))
        .filter(user_role::Column::IsActive.eq(true))
        .count(db)
        .await?)
}

/// Ids from `ids` that are not active roles
pub async fn missing_active_roles<C: ConnectionTrait>(
    db: &C,
    ids: &BTreeSet<i64>,
) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: BTreeSet<i64> = Role::find()
        .filter(role::Column::Id.is_in(ids.iter().copied()))
        .filter(role::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    Ok(ids.difference(&found).copied().collect())
}

async fn find_active_role<C: ConnectionTrait>(db: &C, role_id: i64) -> Result<role::Model> {
    Role::find_by_id(role_id)
        .filter(role::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
}

/// Active roles ordered by id
pub async fn list_roles(db: &DbConn) -> Result<Vec<RoleResponse>> {
    let roles = Role::find()
        .filter(role::Column::IsActive.eq(true))
        .order_by_asc(role::Column::Id)
        .all(db)
        .await?;

    let mut responses = Vec::with_capacity(roles.len());
    for r in roles {
        responses.push(role_response(db, r).await?);
    }
    Ok(responses)
}

pub async fn get_role(db: &DbConn, role_id: i64) -> Result<RoleResponse> {
    let found = find_active_role(db, role_id).await?;
    role_response(db, found).await
}

async fn validate_role_request(
    db: &DbConn,
    req: &RoleRequest,
    existing: Option<&role::Model>,
) -> Result<()> {
    let mut violations = Violations::of(req);
    let name = req.name.trim();

    let mut same_name = Role::find().filter(role::Column::Name.eq(name));
    if let Some(current) = existing {
        same_name = same_name.filter(role::Column::Id.ne(current.id));
    }
    violations.check(
        same_name.one(db).await?.is_some(),
        format!("Role name '{}' already exists", name),
    );

    let menu_ids: BTreeSet<i64> = req.menu_ids.iter().copied().collect();
    for id in missing_active_menus(db, &menu_ids).await? {
        violations.push(format!("Menu {} does not exist or is inactive", id));
    }

    if let Some(permission_ids) = &req.permission_ids {
        let permission_ids: BTreeSet<i64> = permission_ids.iter().copied().collect();
        for id in missing_active_permissions(db, &permission_ids).await? {
            violations.push(format!("Permission {} does not exist or is inactive", id));
        }
    }

    if let Some(current) = existing.filter(|r| r.is_system()) {
        violations.check(name != current.name, "System roles cannot be renamed");
        violations.check(!req.is_active, "System roles cannot be deactivated");
    }

    violations.into_result()
}

async fn insert_role_menus(
    txn: &DatabaseTransaction,
    role_id: i64,
    menu_ids: &BTreeSet<i64>,
    actor: Actor,
    now: DateTime<Utc>,
) -> Result<()> {
    for &menu_id in menu_ids {
        role_menu::ActiveModel {
            role_id: Set(role_id),
            menu_id: Set(menu_id),
            is_active: Set(true),
            granted_at: Set(now),
            granted_by: Set(actor.audit_id()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn insert_role_permissions(
    txn: &DatabaseTransaction,
    role_id: i64,
    permission_ids: &BTreeSet<i64>,
    actor: Actor,
    now: DateTime<Utc>,
) -> Result<()> {
    for &permission_id in permission_ids {
        role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
            is_granted: Set(true),
            granted_by: Set(actor.audit_id()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

pub async fn create_role(db: &DbConn, actor: Actor, req: RoleRequest) -> Result<RoleResponse> {
    validate_role_request(db, &req, None).await?;

    let menu_ids: BTreeSet<i64> = req.menu_ids.iter().copied().collect();
    let permission_ids: BTreeSet<i64> = req.permission_ids.iter().flatten().copied().collect();
    let now = Utc::now();

    let txn = db.begin().await?;
    let created = role::ActiveModel {
        name: Set(req.name.trim().to_string()),
        description: Set(req.description),
        is_active: Set(req.is_active),
        system_role: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.audit_id()),
        updated_by: Set(actor.audit_id()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_role_menus(&txn, created.id, &menu_ids, actor, now).await?;
    insert_role_permissions(&txn, created.id, &permission_ids, actor, now).await?;
    txn.commit().await?;

    tracing::info!(
        role_id = created.id,
        actor = actor.user_id,
        menus = menu_ids.len(),
        permissions = permission_ids.len(),
        "Role created"
    );
    role_response(db, created).await
}

/// Replace a role's fields and menu visibility; grants are replaced only
/// when `permissionIds` is supplied. Inactive roles can be reactivated here.
pub async fn update_role(
    db: &DbConn,
    actor: Actor,
    role_id: i64,
    req: RoleRequest,
) -> Result<RoleResponse> {
    let existing = Role::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))?;

    validate_role_request(db, &req, Some(&existing)).await?;

    let menu_ids: BTreeSet<i64> = req.menu_ids.iter().copied().collect();
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut model: role::ActiveModel = existing.into();
    model.name = Set(req.name.trim().to_string());
    model.description = Set(req.description);
    model.is_active = Set(req.is_active);
    model.updated_at = Set(now);
    model.updated_by = Set(actor.audit_id());
    let updated = model.update(&txn).await?;

    RoleMenu::delete_many()
        .filter(role_menu::Column::RoleId.eq(role_id))
        .exec(&txn)
        .await?;
    insert_role_menus(&txn, role_id, &menu_ids, actor, now).await?;

    if let Some(permission_ids) = &req.permission_ids {
        let permission_ids: BTreeSet<i64> = permission_ids.iter().copied().collect();
        RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        insert_role_permissions(&txn, role_id, &permission_ids, actor, now).await?;
    }
    txn.commit().await?;

    tracing::info!(role_id, actor = actor.user_id, "Role updated");
    role_response(db, updated).await
}

/// Grant or revoke one permission, keeping the grant row either way
pub async fn set_grant(
    db: &DbConn,
    actor: Actor,
    role_id: i64,
    permission_id: i64,
    is_granted: bool,
) -> Result<GrantResponse> {
    find_active_role(db, role_id).await?;
    let perm = Permission::find_by_id(permission_id)
        .filter(permission::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

    let now = Utc::now();
    let existing = RolePermission::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .one(db)
        .await?;

    let grant = match existing {
        Some(row) => {
            let mut model: role_permission::ActiveModel = row.into();
            model.is_granted = Set(is_granted);
            model.granted_by = Set(actor.audit_id());
            model.updated_at = Set(now);
            model.update(db).await?
        }
        None => {
            role_permission::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(permission_id),
                is_granted: Set(is_granted),
                granted_by: Set(actor.audit_id()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    tracing::info!(
        role_id,
        permission = %perm.key,
        is_granted,
        actor = actor.user_id,
        "Role permission grant changed"
    );

    Ok(GrantResponse {
        role_id,
        permission_id,
        permission_key: perm.key,
        is_granted: grant.is_granted,
    })
}

/// Soft-delete a role. Active user assignments block the delete unless
/// `force` is set, in which case assignments, menu visibility and grants are
/// removed as well.
pub async fn delete_role(
    db: &DbConn,
    actor: Actor,
    role_id: i64,
    force: bool,
) -> Result<DeleteOutcome> {
    let existing = find_active_role(db, role_id).await?;

    if existing.is_system() {
        return Err(AppError::BadRequest(
            "System roles cannot be deleted".to_string(),
        ));
    }

    let assigned = active_assignment_count(db, role_id).await?;
    if assigned > 0 && !force {
        return Err(AppError::Conflict(format!(
            "Role is assigned to {} user(s). Use forceDelete=true to remove the assignments and delete the role",
            assigned
        )));
    }

    let txn = db.begin().await?;
    if force {
        let removed = UserRole::delete_many()
            .filter(user_role::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        tracing::debug!(role_id, rows = removed.rows_affected, "Removed role assignments");
    }
    let mut model: role::ActiveModel = existing.into();
    model.is_active = Set(false);
    model.updated_at = Set(Utc::now());
    model.updated_by = Set(actor.audit_id());
    model.update(&txn).await?;
    txn.commit().await?;

    let mut warnings = Vec::new();
    if force {
        if let Err(e) = RoleMenu::delete_many()
            .filter(role_menu::Column::RoleId.eq(role_id))
            .exec(db)
            .await
        {
            tracing::warn!(role_id, "Failed to remove role menus: {}", e);
            warnings.push(format!("Failed to remove menu visibility records: {}", e));
        }
        if let Err(e) = RolePermission::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(db)
            .await
        {
            tracing::warn!(role_id, "Failed to remove role permissions: {}", e);
            warnings.push(format!("Failed to remove permission grants: {}", e));
        }
    }

    tracing::info!(
        role_id,
        force,
        affected_users = assigned,
        actor = actor.user_id,
        "Role deleted"
    );

    Ok(DeleteOutcome {
        affected_users_count: Some(assigned),
        warnings,
        ..Default::default()
    })
}
