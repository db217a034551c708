//! Per-warehouse stocking of an item.
//!
//! `(item_id, warehouse_id)` is the natural key. `stock_quantity` is only ever
//! changed by ledger movements and transfers; `opening_quantity` keeps the
//! quantity the row was created with so the ledger can be replayed.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, PriceCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub item_id: i32,
    pub warehouse_id: i32,
    pub price: PriceCents,
    pub stock_quantity: i64,
    pub opening_quantity: i64,
    pub supplier_id: i32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_rows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub warehouse_id: i32,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub opening_quantity: i64,
    pub supplier_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Items,
    #[sea_orm(
        belongs_to = "super::warehouses::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouses::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Warehouses,
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Suppliers,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::warehouses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouses.def()
    }
}

impl Related<super::suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&StockRow> for ActiveModel {
    fn from(row: &StockRow) -> Self {
        Self {
            item_id: ActiveValue::Set(row.item_id),
            warehouse_id: ActiveValue::Set(row.warehouse_id),
            price_cents: ActiveValue::Set(row.price.cents()),
            stock_quantity: ActiveValue::Set(row.stock_quantity),
            opening_quantity: ActiveValue::Set(row.opening_quantity),
            supplier_id: ActiveValue::Set(row.supplier_id),
        }
    }
}

impl TryFrom<Model> for StockRow {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            item_id: model.item_id,
            warehouse_id: model.warehouse_id,
            price: PriceCents::try_new(model.price_cents)?,
            stock_quantity: model.stock_quantity,
            opening_quantity: model.opening_quantity,
            supplier_id: model.supplier_id,
        })
    }
}
