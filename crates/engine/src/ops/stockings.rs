use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    CreateStockingCmd, EngineError, Item, ResultEngine, StockRow, UpdateStockingCmd,
    error::is_unique_violation,
    items, ledger_entries, stock_rows,
    util::{item_name_key, normalize_required_text},
};

use super::{
    Engine, claim_write_lock, require_stock_row_locked, require_supplier, require_warehouse,
    stock_row_not_found, with_tx,
};

/// Outcome of [`Engine::create_stocking`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockingCreated {
    pub item_id: i32,
    pub warehouse_id: i32,
    /// `false` when the name resolved to an item already stocked elsewhere.
    pub is_new_item: bool,
    /// The item's category. For a reused item this is the stored category,
    /// not the one passed in.
    pub category: String,
}

impl Engine {
    /// Registers an item in a warehouse.
    ///
    /// The name is matched case-insensitively against known items:
    /// - already stocked in this warehouse: [`EngineError::DuplicateInWarehouse`]
    /// - stocked elsewhere: the existing item id and category are reused
    /// - unknown: a fresh item id is assigned
    pub async fn create_stocking(&self, cmd: CreateStockingCmd) -> ResultEngine<StockingCreated> {
        let name = normalize_required_text(&cmd.name, "item name")?;
        let name_key = item_name_key(&cmd.name)?;
        let category = normalize_required_text(&cmd.category, "category")?;
        if cmd.quantity < 0 {
            return Err(EngineError::Validation(
                "initial quantity must be >= 0".to_string(),
            ));
        }

        let created: ResultEngine<StockingCreated> = with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            require_warehouse(&db_tx, cmd.warehouse_id).await?;
            require_supplier(&db_tx, cmd.supplier_id).await?;

            let existing = items::Entity::find()
                .filter(items::Column::NameNorm.eq(name_key.clone()))
                .one(&db_tx)
                .await?;

            let (item, is_new_item) = match existing {
                Some(item) => {
                    let stocked_here = stock_rows::Entity::find_by_id((item.id, cmd.warehouse_id))
                        .one(&db_tx)
                        .await?;
                    if stocked_here.is_some() {
                        tracing::debug!(
                            item_id = item.id,
                            warehouse_id = cmd.warehouse_id,
                            "stocking refused: already in warehouse"
                        );
                        return Err(EngineError::DuplicateInWarehouse {
                            item_id: item.id,
                            warehouse_id: cmd.warehouse_id,
                        });
                    }
                    (item, false)
                }
                None => {
                    let active = items::ActiveModel {
                        id: ActiveValue::NotSet,
                        name: ActiveValue::Set(name),
                        name_norm: ActiveValue::Set(name_key),
                        category: ActiveValue::Set(category),
                    };
                    let item = active.insert(&db_tx).await.map_err(|err| {
                        if is_unique_violation(&err) {
                            // Lost a race against an identical create; a retry
                            // takes the reuse path.
                            EngineError::Unavailable(
                                "item was created concurrently, retry".to_string(),
                            )
                        } else {
                            err.into()
                        }
                    })?;
                    (item, true)
                }
            };

            let row = StockRow {
                item_id: item.id,
                warehouse_id: cmd.warehouse_id,
                price: cmd.price,
                stock_quantity: cmd.quantity,
                opening_quantity: cmd.quantity,
                supplier_id: cmd.supplier_id,
            };
            stock_rows::Entity::insert(stock_rows::ActiveModel::from(&row))
                .exec_without_returning(&db_tx)
                .await
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        EngineError::DuplicateInWarehouse {
                            item_id: item.id,
                            warehouse_id: cmd.warehouse_id,
                        }
                    } else {
                        err.into()
                    }
                })?;

            Ok(StockingCreated {
                item_id: item.id,
                warehouse_id: cmd.warehouse_id,
                is_new_item,
                category: item.category,
            })
        });
        let created = created?;

        tracing::info!(
            item_id = created.item_id,
            warehouse_id = created.warehouse_id,
            is_new_item = created.is_new_item,
            "stocking created"
        );
        Ok(created)
    }

    /// Changes price and/or supplier of a stock row.
    pub async fn update_stocking(&self, cmd: UpdateStockingCmd) -> ResultEngine<StockRow> {
        if cmd.price.is_none() && cmd.supplier_id.is_none() {
            return Err(EngineError::Validation("nothing to update".to_string()));
        }

        with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            let model = require_stock_row_locked(&db_tx, cmd.item_id, cmd.warehouse_id).await?;
            if let Some(supplier_id) = cmd.supplier_id {
                require_supplier(&db_tx, supplier_id).await?;
            }

            let mut active: stock_rows::ActiveModel = model.into();
            if let Some(price) = cmd.price {
                active.price_cents = ActiveValue::Set(price.cents());
            }
            if let Some(supplier_id) = cmd.supplier_id {
                active.supplier_id = ActiveValue::Set(supplier_id);
            }
            let updated = active.update(&db_tx).await?;
            StockRow::try_from(updated)
        })
    }

    /// Removes a stock row that never moved.
    ///
    /// Rows with ledger history are refused with
    /// [`EngineError::StockingInUse`]; the item itself is never deleted.
    pub async fn remove_stocking(&self, item_id: i32, warehouse_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            require_stock_row_locked(&db_tx, item_id, warehouse_id).await?;

            let entries = ledger_entries::Entity::find()
                .filter(ledger_entries::Column::ItemId.eq(item_id))
                .filter(ledger_entries::Column::WarehouseId.eq(warehouse_id))
                .count(&db_tx)
                .await?;
            if entries > 0 {
                return Err(EngineError::StockingInUse(format!(
                    "item {item_id} in warehouse {warehouse_id} has {entries} ledger entries"
                )));
            }

            stock_rows::Entity::delete_by_id((item_id, warehouse_id))
                .exec(&db_tx)
                .await?;
            tracing::info!(item_id, warehouse_id, "stocking removed");
            Ok(())
        })
    }

    pub async fn stock_row(&self, item_id: i32, warehouse_id: i32) -> ResultEngine<StockRow> {
        let model = stock_rows::Entity::find_by_id((item_id, warehouse_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| stock_row_not_found(item_id, warehouse_id))?;
        StockRow::try_from(model)
    }

    /// Every stocking of an item, by warehouse id.
    pub async fn item_stock_rows(&self, item_id: i32) -> ResultEngine<Vec<StockRow>> {
        self.item(item_id).await?;
        let models = stock_rows::Entity::find()
            .filter(stock_rows::Column::ItemId.eq(item_id))
            .order_by_asc(stock_rows::Column::WarehouseId)
            .all(&self.database)
            .await?;
        models.into_iter().map(StockRow::try_from).collect()
    }

    pub async fn item(&self, item_id: i32) -> ResultEngine<Item> {
        let model = items::Entity::find_by_id(item_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("item {item_id}")))?;
        Ok(model.into())
    }
}
