//! Migration: Create role_menus visibility table

use sea_orm_migration::prelude::*;

use super::m20261001_000002_create_roles::Roles;
use super::m20261001_000003_create_menus::Menus;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleMenus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleMenus::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoleMenus::RoleId).big_integer().not_null())
                    .col(ColumnDef::new(RoleMenus::MenuId).big_integer().not_null())
                    .col(
                        ColumnDef::new(RoleMenus::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RoleMenus::GrantedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoleMenus::GrantedBy).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoleMenus::Table, RoleMenus::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RoleMenus::Table, RoleMenus::MenuId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_menus_unique")
                    .table(RoleMenus::Table)
                    .col(RoleMenus::RoleId)
                    .col(RoleMenus::MenuId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleMenus::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "role_menus"]
enum RoleMenus {
    Table,
    Id,
    #[iden = "role_id"]
    RoleId,
    #[iden = "menu_id"]
    MenuId,
    #[iden = "is_active"]
    IsActive,
    #[iden = "granted_at"]
    GrantedAt,
    #[iden = "granted_by"]
    GrantedBy,
}
