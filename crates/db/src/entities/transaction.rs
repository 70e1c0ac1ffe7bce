//! `SeaORM` Entity for the transaction table.
//!
//! `type`, `from` and `to` are reserved words in Rust or SQL, so those columns
//! are mapped onto differently named fields.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub account: i32,
    #[sea_orm(column_name = "type")]
    pub transaction_type: String,
    pub value: i32,
    pub kind: String,
    #[sea_orm(column_name = "from")]
    pub from_account: Option<i32>,
    #[sea_orm(column_name = "to")]
    pub to_account: Option<i32>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
