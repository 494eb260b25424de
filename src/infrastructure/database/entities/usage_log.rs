//! Usage log entity
//!
//! Append-only; rows are never updated or deleted and carry no foreign
//! keys so they survive deletion of the spot or lot they reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: String,
    pub spot_id: i64,
    pub lot_id: i64,
    pub vehicle_id: String,

    pub entered_at: DateTimeUtc,
    pub exited_at: DateTimeUtc,

    /// Billable hours, floored at 1.0
    #[sea_orm(column_type = "Double")]
    pub duration_hours: f64,

    #[sea_orm(column_type = "Double")]
    pub cost: f64,

    pub remarks: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
