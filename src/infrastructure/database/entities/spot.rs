//! Parking spot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_spots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub lot_id: i64,

    /// 1-based slot number, contiguous within the lot
    pub number: i32,

    /// "A" = Available, "O" = Occupied
    pub status: String,

    #[sea_orm(nullable)]
    pub vehicle_id: Option<String>,

    /// User id of the current occupant
    #[sea_orm(nullable)]
    pub occupant_id: Option<String>,

    #[sea_orm(nullable)]
    pub occupant_name: Option<String>,

    #[sea_orm(nullable)]
    pub occupied_since: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lot::Entity",
        from = "Column::LotId",
        to = "super::lot::Column::Id"
    )]
    Lot,
}

impl Related<super::lot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
