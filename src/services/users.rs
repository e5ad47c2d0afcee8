use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::error::{AppError, Result};
use crate::models::prelude::*;
use crate::schemas::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::authorization::resolve_user_permissions;
use crate::services::roles::missing_active_roles;
use crate::services::security::{hash_password, SecuritySettings};
use crate::services::validation::Violations;
use crate::services::Actor;
use crate::state::DbConn;

/// Active roles actively assigned to a user, ordered by id
async fn assigned_roles<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<role::Model>> {
    let mut roles: Vec<role::Model> = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::IsActive.eq(true))
        .find_also_related(Role)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(_, r)| r)
        .filter(|r| r.is_active)
        .collect();
    roles.sort_by_key(|r| r.id);
    Ok(roles)
}

async fn user_response<C: ConnectionTrait>(db: &C, found: user::Model) -> Result<UserResponse> {
    let roles = assigned_roles(db, found.id).await?;
    Ok(UserResponse::from_user_with_roles(found, roles))
}

async fn find_user<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Every user, active or not, ordered by id
pub async fn list_users(db: &DbConn) -> Result<Vec<UserResponse>> {
    let users = User::find().order_by_asc(user::Column::Id).all(db).await?;

    let mut responses = Vec::with_capacity(users.len());
    for u in users {
        responses.push(user_response(db, u).await?);
    }
    Ok(responses)
}

pub async fn get_user(db: &DbConn, user_id: i64) -> Result<UserResponse> {
    let found = find_user(db, user_id).await?;
    user_response(db, found).await
}

/// Effective permission keys of an existing user
pub async fn user_permissions(db: &DbConn, user_id: i64) -> Result<Vec<String>> {
    find_user(db, user_id).await?;
    Ok(resolve_user_permissions(db, user_id)
        .await?
        .into_iter()
        .collect())
}

async fn check_identity(
    db: &DbConn,
    violations: &mut Violations,
    username: &str,
    email: &str,
    role_ids: &BTreeSet<i64>,
    exclude: Option<i64>,
) -> Result<()> {
    let mut same_username = User::find().filter(user::Column::Username.eq(username));
    let mut same_email = User::find().filter(user::Column::Email.eq(email));
    if let Some(id) = exclude {
        same_username = same_username.filter(user::Column::Id.ne(id));
        same_email = same_email.filter(user::Column::Id.ne(id));
    }

    violations.check(
        same_username.one(db).await?.is_some(),
        format!("Username '{}' already exists", username),
    );
    violations.check(
        same_email.one(db).await?.is_some(),
        format!("Email '{}' already exists", email),
    );
    for id in missing_active_roles(db, role_ids).await? {
        violations.push(format!("Role {} does not exist or is inactive", id));
    }
    Ok(())
}

/// Make the active assignments of `user_id` exactly `role_ids`: removed ones
/// are deactivated, returning ones reactivated, new ones inserted
async fn replace_assignments(
    txn: &DatabaseTransaction,
    user_id: i64,
    role_ids: &BTreeSet<i64>,
    actor: Actor,
    now: DateTime<Utc>,
) -> Result<()> {
    let existing: HashMap<i64, user_role::Model> = UserRole::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|ur| (ur.role_id, ur))
        .collect();

    for (role_id, assignment) in &existing {
        let wanted = role_ids.contains(role_id);
        if wanted == assignment.is_active {
            continue;
        }
        let mut model: user_role::ActiveModel = assignment.clone().into();
        model.is_active = Set(wanted);
        if wanted {
            model.assigned_at = Set(now);
            model.assigned_by = Set(actor.audit_id());
        }
        model.update(txn).await?;
    }

    for &role_id in role_ids.iter().filter(|id| !existing.contains_key(*id)) {
        user_role::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
            is_active: Set(true),
            assigned_at: Set(now),
            assigned_by: Set(actor.audit_id()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

pub async fn create_user(
    db: &DbConn,
    security: &SecuritySettings,
    actor: Actor,
    req: CreateUserRequest,
) -> Result<UserResponse> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();
    let role_ids: BTreeSet<i64> = req.role_ids.iter().copied().collect();

    let mut violations = Violations::of(&req);
    check_identity(db, &mut violations, &username, &email, &role_ids, None).await?;
    violations.into_result()?;

    let hashed_password = hash_password(&req.password, security.bcrypt_cost)?;
    let now = Utc::now();

    let txn = db.begin().await?;
    let created = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        full_name: Set(req.full_name),
        hashed_password: Set(hashed_password),
        is_active: Set(req.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.audit_id()),
        updated_by: Set(actor.audit_id()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    replace_assignments(&txn, created.id, &role_ids, actor, now).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = created.id,
        username = %created.username,
        actor = actor.user_id,
        "User created"
    );
    user_response(db, created).await
}

pub async fn update_user(
    db: &DbConn,
    security: &SecuritySettings,
    actor: Actor,
    user_id: i64,
    req: UpdateUserRequest,
) -> Result<UserResponse> {
    let existing = find_user(db, user_id).await?;

    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();
    let role_ids: BTreeSet<i64> = req.role_ids.iter().copied().collect();

    let mut violations = Violations::of(&req);
    check_identity(db, &mut violations, &username, &email, &role_ids, Some(user_id)).await?;
    violations.check(
        user_id == actor.user_id && !req.is_active,
        "You cannot deactivate your own account",
    );
    violations.into_result()?;

    let hashed_password = match &req.password {
        Some(password) => Some(hash_password(password, security.bcrypt_cost)?),
        None => None,
    };
    let now = Utc::now();

    let txn = db.begin().await?;
    let mut model: user::ActiveModel = existing.into();
    model.username = Set(username);
    model.email = Set(email);
    model.full_name = Set(req.full_name);
    model.is_active = Set(req.is_active);
    if let Some(hashed) = hashed_password {
        model.hashed_password = Set(hashed);
    }
    model.updated_at = Set(now);
    model.updated_by = Set(actor.audit_id());
    let updated = model.update(&txn).await?;
    replace_assignments(&txn, user_id, &role_ids, actor, now).await?;
    txn.commit().await?;

    tracing::info!(user_id, actor = actor.user_id, "User updated");
    user_response(db, updated).await
}

/// Soft-delete a user and deactivate its role assignments
pub async fn delete_user(db: &DbConn, actor: Actor, user_id: i64) -> Result<()> {
    if user_id == actor.user_id {
        return Err(AppError::Conflict(
            "You cannot delete your own account".to_string(),
        ));
    }

    let existing = find_user(db, user_id).await?;
    if !existing.is_active {
        tracing::debug!(user_id, "User already inactive");
        return Ok(());
    }

    let now = Utc::now();
    let txn = db.begin().await?;
    let mut model: user::ActiveModel = existing.into();
    model.is_active = Set(false);
    model.updated_at = Set(now);
    model.updated_by = Set(actor.audit_id());
    model.update(&txn).await?;

    UserRole::update_many()
        .col_expr(user_role::Column::IsActive, Expr::value(false))
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    tracing::info!(user_id, actor = actor.user_id, "User deleted");
    Ok(())
}
