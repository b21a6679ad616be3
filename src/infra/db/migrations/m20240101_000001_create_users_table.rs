//! Migration: Create the users table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Login).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Firstname).string().not_null().default(""))
                    .col(ColumnDef::new(Users::Lastname).string().not_null().default(""))
                    .col(ColumnDef::new(Users::Email).string().not_null().default(""))
                    .col(ColumnDef::new(Users::Role).string().not_null().default("user"))
                    .col(ColumnDef::new(Users::ManagerId).uuid().null())
                    .col(ColumnDef::new(Users::ManagerDn).string().null())
                    .col(ColumnDef::new(Users::Country).string_len(2).not_null().default("fr"))
                    .col(ColumnDef::new(Users::LdapUser).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::Dn).string().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_manager")
                            .from(Users::Table, Users::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Managers are listed by role on every account form
        manager
            .create_index(
                Index::create()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Users {
    Table,
    Id,
    Login,
    PasswordHash,
    Firstname,
    Lastname,
    Email,
    Role,
    ManagerId,
    ManagerDn,
    Country,
    LdapUser,
    Dn,
    CreatedAt,
    UpdatedAt,
}
