//! Create reminder_logs table

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
                    .table(ReminderLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReminderLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReminderLogs::UserId).string().not_null())
                    .col(
                        ColumnDef::new(ReminderLogs::ReminderType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReminderLogs::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reminder_logs_user")
                            .from(ReminderLogs::Table, ReminderLogs::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reminder_logs_type_sent")
                    .table(ReminderLogs::Table)
                    .col(ReminderLogs::ReminderType)
                    .col(ReminderLogs::SentAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReminderLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ReminderLogs {
    Table,
    Id,
    UserId,
    ReminderType,
    SentAt,
}
