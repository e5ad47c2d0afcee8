//! Migration: Seed the built-in menus, permissions and system roles

use std::collections::HashMap;

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use crate::models::{MenuType, PermissionType, SystemRole};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let menu_ids = seed_menus(db).await?;
        let permission_ids = seed_permissions(db, &menu_ids).await?;
        seed_roles(db, &menu_ids, &permission_ids).await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Seeding is not reversible - data may have been modified
        Ok(())
    }
}

/// (name, display name, icon, route, parent name, sort order)
const DEFAULT_MENUS: &[(&str, &str, &str, Option<&str>, Option<&str>, i32)] = &[
    ("dashboard", "Dashboard", "dashboard", Some("/admin/dashboard"), None, 0),
    ("access_control", "Access Control", "shield", None, None, 10),
    ("users", "Users", "person", Some("/admin/users"), Some("access_control"), 0),
    ("roles", "Roles", "badge", Some("/admin/roles"), Some("access_control"), 10),
    ("menus", "Menus", "menu", Some("/admin/menus"), Some("access_control"), 20),
    (
        "permissions",
        "Permissions",
        "key",
        Some("/admin/permissions"),
        Some("access_control"),
        30,
    ),
];

/// Menus whose View/Create/Edit/Delete permissions are seeded
const MANAGED_MENUS: &[&str] = &["users", "roles", "menus", "permissions"];

async fn seed_menus(db: &SchemaManagerConnection<'_>) -> Result<HashMap<&'static str, i64>, DbErr> {
    use crate::models::prelude::*;

    let mut ids = HashMap::new();
    if Menu::find().count(db).await? > 0 {
        return Ok(ids);
    }

    let now = chrono::Utc::now();
    for (name, display_name, icon, route, parent, sort_order) in DEFAULT_MENUS {
        let parent_id = match parent {
            Some(parent) => Some(*ids.get(parent).ok_or_else(|| {
                DbErr::Custom(format!("Parent menu {} must be seeded first", parent))
            })?),
            None => None,
        };

        let created = menu::ActiveModel {
            name: Set(ToString::to_string(name)),
            display_name: Set(ToString::to_string(display_name)),
            description: Set(None),
            icon: Set(Some(ToString::to_string(icon))),
            route: Set(route.map(String::from)),
            menu_type: Set(MenuType::Admin),
            parent_id: Set(parent_id),
            sort_order: Set(*sort_order),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(None),
            updated_by: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        ids.insert(*name, created.id);
    }

    Ok(ids)
}

async fn seed_permissions(
    db: &SchemaManagerConnection<'_>,
    menu_ids: &HashMap<&'static str, i64>,
) -> Result<HashMap<String, i64>, DbErr> {
    use crate::models::prelude::*;

    let mut ids = HashMap::new();
    if menu_ids.is_empty() {
        return Ok(ids);
    }

    let now = chrono::Utc::now();
    let mut seeds = vec![("dashboard", PermissionType::View)];
    for menu in MANAGED_MENUS {
        for permission_type in [
            PermissionType::View,
            PermissionType::Create,
            PermissionType::Edit,
            PermissionType::Delete,
        ] {
            seeds.push((*menu, permission_type));
        }
    }

    for (menu_name, permission_type) in seeds {
        let menu_id = *menu_ids
            .get(menu_name)
            .ok_or_else(|| DbErr::Custom(format!("Menu {} not seeded", menu_name)))?;
        let key = format!("{}.{}", menu_name, permission_type.to_string().to_lowercase());

        let created = permission::ActiveModel {
            key: Set(key.clone()),
            display_name: Set(format!("{} {}", permission_type, title_case(menu_name))),
            description: Set(None),
            permission_type: Set(permission_type),
            menu_id: Set(menu_id),
            is_active: Set(true),
            is_system_permission: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        ids.insert(key, created.id);
    }

    Ok(ids)
}

async fn seed_roles(
    db: &SchemaManagerConnection<'_>,
    menu_ids: &HashMap<&'static str, i64>,
    permission_ids: &HashMap<String, i64>,
) -> Result<(), DbErr> {
    use crate::models::prelude::*;

    if Role::find().count(db).await? > 0 || menu_ids.is_empty() {
        return Ok(());
    }

    let now = chrono::Utc::now();
    let all_menus: Vec<i64> = menu_ids.values().copied().collect();
    let all_permissions: Vec<i64> = permission_ids.values().copied().collect();
    let dashboard_menu: Vec<i64> = menu_ids.get("dashboard").copied().into_iter().collect();
    let dashboard_permission: Vec<i64> = permission_ids
        .get("dashboard.view")
        .copied()
        .into_iter()
        .collect();

    let default_roles = [
        (
            "SuperAdmin",
            "Unrestricted access to the admin console",
            SystemRole::SuperAdmin,
            &all_menus,
            &all_permissions,
        ),
        (
            "Admin",
            "Manages users, roles and menus",
            SystemRole::Admin,
            &all_menus,
            &all_permissions,
        ),
        (
            "User",
            "Default role for platform users",
            SystemRole::User,
            &dashboard_menu,
            &dashboard_permission,
        ),
    ];

    for (name, description, system_role, menus, permissions) in default_roles {
        let created = role::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            is_active: Set(true),
            system_role: Set(Some(system_role)),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(None),
            updated_by: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for menu_id in menus.iter() {
            role_menu::ActiveModel {
                role_id: Set(created.id),
                menu_id: Set(*menu_id),
                is_active: Set(true),
                granted_at: Set(now),
                granted_by: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        for permission_id in permissions.iter() {
            role_permission::ActiveModel {
                role_id: Set(created.id),
                permission_id: Set(*permission_id),
                is_granted: Set(true),
                granted_by: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }

    Ok(())
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
