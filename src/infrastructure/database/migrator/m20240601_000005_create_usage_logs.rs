//! Create usage_logs table
//!
//! Append-only billing ledger. Deliberately no foreign keys: entries
//! must survive deletion of the spot, lot or reservation they came from.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsageLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsageLogs::UserId).string().not_null())
                    .col(ColumnDef::new(UsageLogs::SpotId).big_integer().not_null())
                    .col(ColumnDef::new(UsageLogs::LotId).big_integer().not_null())
                    .col(ColumnDef::new(UsageLogs::VehicleId).string().not_null())
                    .col(
                        ColumnDef::new(UsageLogs::EnteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageLogs::ExitedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsageLogs::DurationHours)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UsageLogs::Cost).double().not_null())
                    .col(ColumnDef::new(UsageLogs::Remarks).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_usage_logs_user")
                    .table(UsageLogs::Table)
                    .col(UsageLogs::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_usage_logs_exited")
                    .table(UsageLogs::Table)
                    .col(UsageLogs::ExitedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsageLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UsageLogs {
    Table,
    Id,
    UserId,
    SpotId,
    LotId,
    VehicleId,
    EnteredAt,
    ExitedAt,
    DurationHours,
    Cost,
    Remarks,
}
