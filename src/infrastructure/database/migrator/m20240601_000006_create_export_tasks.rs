//! Create export_tasks table

use sea_orm_migration::prelude::*;

use super::m20240601_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExportTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExportTasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExportTasks::UserId).string().not_null())
                    .col(ColumnDef::new(ExportTasks::ScopeUserId).string())
                    .col(
                        ColumnDef::new(ExportTasks::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ExportTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExportTasks::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ExportTasks::DownloadLink).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_export_tasks_user")
                            .from(ExportTasks::Table, ExportTasks::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_export_tasks_status")
                    .table(ExportTasks::Table)
                    .col(ExportTasks::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExportTasks::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ExportTasks {
    Table,
    Id,
    UserId,
    ScopeUserId,
    Status,
    CreatedAt,
    CompletedAt,
    DownloadLink,
}
