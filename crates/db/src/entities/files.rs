//! `SeaORM` Entity for files table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// Insertion sequence; listings are ordered by it.
    #[sea_orm(primary_key)]
    pub seq: i32,
    pub tenant: String,
    pub file_id: String,
    pub file_name: String,
    pub reference_id: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    pub creator_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
