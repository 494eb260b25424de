//! Export task entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "export_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Requesting user
    pub user_id: String,

    /// Null = whole-system report
    #[sea_orm(nullable)]
    pub scope_user_id: Option<String>,

    /// pending | processing | done | failed
    pub status: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub download_link: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
