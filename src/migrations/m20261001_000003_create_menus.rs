//! Migration: Create menus table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Menus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Menus::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Menus::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Menus::DisplayName).string().not_null())
                    .col(ColumnDef::new(Menus::Description).string().null())
                    .col(ColumnDef::new(Menus::Icon).string().null())
                    .col(ColumnDef::new(Menus::Route).string().null())
                    .col(
                        ColumnDef::new(Menus::MenuType)
                            .string_len(16)
                            .not_null()
                            .default("admin"),
                    )
                    .col(ColumnDef::new(Menus::ParentId).big_integer().null())
                    .col(
                        ColumnDef::new(Menus::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Menus::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Menus::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Menus::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Menus::CreatedBy).big_integer().null())
                    .col(ColumnDef::new(Menus::UpdatedBy).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Menus::Table, Menus::ParentId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_menus_parent")
                    .table(Menus::Table)
                    .col(Menus::ParentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Menus::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Menus {
    Table,
    Id,
    Name,
    #[iden = "display_name"]
    DisplayName,
    Description,
    Icon,
    Route,
    #[iden = "menu_type"]
    MenuType,
    #[iden = "parent_id"]
    ParentId,
    #[iden = "sort_order"]
    SortOrder,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "created_by"]
    CreatedBy,
    #[iden = "updated_by"]
    UpdatedBy,
}
