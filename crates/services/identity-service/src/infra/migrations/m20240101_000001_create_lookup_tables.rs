//! Migration: create the role, status and user type lookup tables with seed rows.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Statuses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Statuses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Statuses::StatusName).string_len(45).not_null())
                    .col(
                        ColumnDef::new(Statuses::StatusValue)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roles::RoleName).string_len(45).not_null())
                    .col(
                        ColumnDef::new(Roles::RoleValue)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserTypes::UserTypeName).string_len(45).not_null())
                    .col(
                        ColumnDef::new(UserTypes::UserTypeValue)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Statuses::Table)
                    .columns([Statuses::StatusName, Statuses::StatusValue])
                    .values_panic(["Active".into(), 10.into()])
                    .values_panic(["Pending".into(), 5.into()])
                    .values_panic(["Banned".into(), 0.into()])
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Roles::Table)
                    .columns([Roles::RoleName, Roles::RoleValue])
                    .values_panic(["User".into(), 10.into()])
                    .values_panic(["Admin".into(), 20.into()])
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::insert()
                    .into_table(UserTypes::Table)
                    .columns([UserTypes::UserTypeName, UserTypes::UserTypeValue])
                    .values_panic(["Free".into(), 10.into()])
                    .values_panic(["Paid".into(), 30.into()])
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Statuses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Statuses {
    Table,
    Id,
    StatusName,
    StatusValue,
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    RoleName,
    RoleValue,
}

#[derive(Iden)]
enum UserTypes {
    Table,
    Id,
    UserTypeName,
    UserTypeValue,
}
