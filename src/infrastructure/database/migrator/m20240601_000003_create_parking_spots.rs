//! Create parking_spots table
//!
//! Slot numbers are kept contiguous (1..N per lot) by the capacity
//! reconciler; the unique index on (lot_id, number) backs that invariant.

use sea_orm_migration::prelude::*;

use super::m20240601_000002_create_parking_lots::ParkingLots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSpots::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParkingSpots::LotId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingSpots::Number).integer().not_null())
                    .col(
                        ColumnDef::new(ParkingSpots::Status)
                            .string()
                            .not_null()
                            .default("A"),
                    )
                    .col(ColumnDef::new(ParkingSpots::VehicleId).string())
                    .col(ColumnDef::new(ParkingSpots::OccupantId).string())
                    .col(ColumnDef::new(ParkingSpots::OccupantName).string())
                    .col(
                        ColumnDef::new(ParkingSpots::OccupiedSince)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_spots_lot")
                            .from(ParkingSpots::Table, ParkingSpots::LotId)
                            .to(ParkingLots::Table, ParkingLots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_lot_number")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::LotId)
                    .col(ParkingSpots::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_status")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSpots {
    Table,
    Id,
    LotId,
    Number,
    Status,
    VehicleId,
    OccupantId,
    OccupantName,
    OccupiedSince,
}
