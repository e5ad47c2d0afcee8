pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_roles;
mod m20261001_000003_create_menus;
mod m20261001_000004_create_permissions;
mod m20261001_000005_create_user_roles;
mod m20261001_000006_create_role_permissions;
mod m20261001_000007_create_role_menus;
mod m20261001_000008_seed_defaults;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_roles::Migration),
            Box::new(m20261001_000003_create_menus::Migration),
            Box::new(m20261001_000004_create_permissions::Migration),
            Box::new(m20261001_000005_create_user_roles::Migration),
            Box::new(m20261001_000006_create_role_permissions::Migration),
            Box::new(m20261001_000007_create_role_menus::Migration),
            Box::new(m20261001_000008_seed_defaults::Migration),
        ]
    }
}
