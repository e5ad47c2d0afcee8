use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::schemas::{DeleteOutcome, PermissionRequest, PermissionResponse};
use crate::services::permission_tree::{build_permission_tree, PermissionTreeNode};
use crate::services::validation::Violations;
use crate::services::Actor;
use crate::state::DbConn;

/// Ids from `ids` that are not active permissions
pub async fn missing_active_permissions<C: ConnectionTrait>(
    db: &C,
    ids: &BTreeSet<i64>,
) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: BTreeSet<i64> = Permission::find()
        .filter(permission::Column::Id.is_in(ids.iter().copied()))
        .filter(permission::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    Ok(ids.difference(&found).copied().collect())
}

pub async fn permission_tree(db: &DbConn) -> Result<Vec<PermissionTreeNode>> {
    let rows = Permission::find()
        .find_also_related(Menu)
        .order_by_asc(permission::Column::Key)
        .all(db)
        .await?;

    Ok(build_permission_tree(rows))
}

pub async fn get_permission(db: &DbConn, permission_id: i64) -> Result<PermissionResponse> {
    let (perm, owner) = Permission::find_by_id(permission_id)
        .find_also_related(Menu)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

    Ok(PermissionResponse::from_permission(perm, owner))
}

async fn validate_permission_request(
    db: &DbConn,
    req: &PermissionRequest,
    existing: Option<&permission::Model>,
) -> Result<()> {
    let mut violations = Violations::of(req);

    let mut same_key = Permission::find().filter(permission::Column::Key.eq(&req.key));
    if let Some(current) = existing {
        same_key = same_key.filter(permission::Column::Id.ne(current.id));
    }
    violations.check(
        same_key.one(db).await?.is_some(),
        format!("Permission key '{}' already exists", req.key),
    );

    let owner = Menu::find_by_id(req.menu_id)
        .filter(menu::Column::IsActive.eq(true))
        .one(db)
        .await?;
    violations.check(
        owner.is_none(),
        format!("Menu {} does not exist or is inactive", req.menu_id),
    );

    if let Some(current) = existing.filter(|p| p.is_system_permission) {
        violations.check(
            current.key != req.key,
            "The key of a system permission cannot be changed",
        );
    }

    violations.into_result()
}

pub async fn create_permission(
    db: &DbConn,
    actor: Actor,
    req: PermissionRequest,
) -> Result<PermissionResponse> {
    validate_permission_request(db, &req, None).await?;

    let now = Utc::now();
    let created = permission::ActiveModel {
        key: Set(req.key),
        display_name: Set(req.display_name),
        description: Set(req.description),
        permission_type: Set(req.permission_type),
        menu_id: Set(req.menu_id),
        is_active: Set(req.is_active),
        is_system_permission: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(
        permission_id = created.id,
        key = %created.key,
        actor = actor.user_id,
        "Permission created"
    );
    get_permission(db, created.id).await
}

pub async fn update_permission(
    db: &DbConn,
    actor: Actor,
    permission_id: i64,
    req: PermissionRequest,
) -> Result<PermissionResponse> {
    let existing = Permission::find_by_id(permission_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

    validate_permission_request(db, &req, Some(&existing)).await?;

    let mut model: permission::ActiveModel = existing.into();
    model.key = Set(req.key);
    model.display_name = Set(req.display_name);
    model.description = Set(req.description);
    model.permission_type = Set(req.permission_type);
    model.menu_id = Set(req.menu_id);
    model.is_active = Set(req.is_active);
    model.updated_at = Set(Utc::now());
    model.update(db).await?;

    tracing::info!(permission_id, actor = actor.user_id, "Permission updated");
    get_permission(db, permission_id).await
}

/// Soft-delete a permission. System permissions are refused; roles holding
/// an active grant block the delete unless `force` removes those grants.
pub async fn delete_permission(
    db: &DbConn,
    actor: Actor,
    permission_id: i64,
    force: bool,
) -> Result<DeleteOutcome> {
    let existing = Permission::find_by_id(permission_id)
        .filter(permission::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found".to_string()))?;

    if existing.is_system_permission {
        return Err(AppError::BadRequest(
            "System permissions cannot be deleted".to_string(),
        ));
    }

    let granted = RolePermission::find()
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .filter(role_permission::Column::IsGranted.eq(true))
        .count(db)
        .await?;
    if granted > 0 && !force {
        return Err(AppError::Conflict(format!(
            "Permission is granted to {} role(s). Use forceDelete=true to revoke the grants and delete the permission",
            granted
        )));
    }

    let mut model: permission::ActiveModel = existing.into();
    model.is_active = Set(false);
    model.updated_at = Set(Utc::now());
    model.update(db).await?;

    let mut warnings = Vec::new();
    if force {
        if let Err(e) = RolePermission::delete_many()
            .filter(role_permission::Column::PermissionId.eq(permission_id))
            .exec(db)
            .await
        {
            tracing::warn!(permission_id, "Failed to remove permission grants: {}", e);
            warnings.push(format!("Failed to remove permission grants: {}", e));
        }
    }

    tracing::info!(permission_id, force, actor = actor.user_id, "Permission deleted");
    Ok(DeleteOutcome {
        affected_role_count: Some(granted),
        warnings,
        ..Default::default()
    })
}
