//! Logical product identity.
//!
//! An item is unique by its normalized name and carries the category shared
//! by every warehouse that stocks it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    /// Display name as first entered.
    pub name: String,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub name_norm: String,
    pub category: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_rows::Entity")]
    StockRows,
}

impl Related<super::stock_rows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Item {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
        }
    }
}
