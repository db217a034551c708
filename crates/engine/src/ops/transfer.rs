use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*, sea_query::OnConflict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Counterparty, EngineError, MovementKind, ResultEngine, TransferStockCmd,
    ledger_entries::{self, NewEntry},
    stock_rows,
    util::require_positive_quantity,
};

use super::{
    Engine, apply_stock_delta, claim_write_lock, require_employee, require_stock_row_locked,
    require_supplier, require_warehouse, stock_row_not_found, with_tx,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChange {
    pub previous_qty: i64,
    pub new_qty: i64,
}

/// Outcome of [`Engine::transfer_stock`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransferred {
    pub transfer_id: Uuid,
    /// The `OUT` leg at the source warehouse.
    pub out_entry_id: i32,
    /// The `IN` leg at the destination warehouse.
    pub in_entry_id: i32,
    pub from: QuantityChange,
    pub to: QuantityChange,
}

impl Engine {
    /// Moves `quantity` units of an item from one warehouse to another.
    ///
    /// Both stock rows change in one transaction, so the item's total across
    /// warehouses is unchanged. A missing destination row is created with the
    /// source price and the given supplier. Rows are locked in
    /// `(warehouse_id, item_id)` order so opposite transfers cannot deadlock.
    pub async fn transfer_stock(&self, cmd: TransferStockCmd) -> ResultEngine<StockTransferred> {
        require_positive_quantity(cmd.quantity)?;
        if cmd.from_warehouse_id == cmd.to_warehouse_id {
            return Err(EngineError::Validation(
                "source and destination warehouse must differ".to_string(),
            ));
        }

        let transferred: ResultEngine<StockTransferred> = with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            require_employee(&db_tx, cmd.employee_id).await?;
            require_supplier(&db_tx, cmd.supplier_id).await?;
            require_warehouse(&db_tx, cmd.to_warehouse_id).await?;

            let source = stock_rows::Entity::find_by_id((cmd.item_id, cmd.from_warehouse_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| stock_row_not_found(cmd.item_id, cmd.from_warehouse_id))?;

            let destination = stock_rows::ActiveModel {
                item_id: ActiveValue::Set(cmd.item_id),
                warehouse_id: ActiveValue::Set(cmd.to_warehouse_id),
                price_cents: ActiveValue::Set(source.price_cents),
                stock_quantity: ActiveValue::Set(0),
                opening_quantity: ActiveValue::Set(0),
                supplier_id: ActiveValue::Set(cmd.supplier_id),
            };
            stock_rows::Entity::insert(destination)
                .on_conflict(
                    OnConflict::columns([
                        stock_rows::Column::ItemId,
                        stock_rows::Column::WarehouseId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;

            let mut order = [cmd.from_warehouse_id, cmd.to_warehouse_id];
            order.sort_unstable();
            let mut from_before = 0;
            let mut to_before = 0;
            for warehouse_id in order {
                let row = require_stock_row_locked(&db_tx, cmd.item_id, warehouse_id).await?;
                if warehouse_id == cmd.from_warehouse_id {
                    from_before = row.stock_quantity;
                } else {
                    to_before = row.stock_quantity;
                }
            }

            if from_before < cmd.quantity {
                tracing::debug!(
                    item_id = cmd.item_id,
                    from = cmd.from_warehouse_id,
                    available = from_before,
                    requested = cmd.quantity,
                    "transfer refused: insufficient stock"
                );
                return Err(EngineError::InsufficientStock {
                    available: from_before,
                    requested: cmd.quantity,
                });
            }

            let transfer_id = Uuid::new_v4();
            let occurred_at = Utc::now();
            let mut legs = Vec::with_capacity(2);
            for (kind, warehouse_id, peer) in [
                (
                    MovementKind::Out,
                    cmd.from_warehouse_id,
                    cmd.to_warehouse_id,
                ),
                (MovementKind::In, cmd.to_warehouse_id, cmd.from_warehouse_id),
            ] {
                let entry = NewEntry {
                    kind,
                    item_id: cmd.item_id,
                    warehouse_id,
                    quantity: cmd.quantity,
                    employee_id: cmd.employee_id,
                    counterparty: Counterparty::Warehouse(peer),
                    transfer_id: Some(transfer_id),
                    occurred_at,
                };
                let inserted = ledger_entries::ActiveModel::from(&entry)
                    .insert(&db_tx)
                    .await?;
                legs.push(inserted.id);
            }

            let from_after =
                apply_stock_delta(&db_tx, cmd.item_id, cmd.from_warehouse_id, -cmd.quantity)
                    .await?
                    .ok_or(EngineError::InsufficientStock {
                        available: from_before,
                        requested: cmd.quantity,
                    })?;
            let to_after =
                apply_stock_delta(&db_tx, cmd.item_id, cmd.to_warehouse_id, cmd.quantity)
                    .await?
                    .ok_or_else(|| stock_row_not_found(cmd.item_id, cmd.to_warehouse_id))?;

            Ok(StockTransferred {
                transfer_id,
                out_entry_id: legs[0],
                in_entry_id: legs[1],
                from: QuantityChange {
                    previous_qty: from_before,
                    new_qty: from_after,
                },
                to: QuantityChange {
                    previous_qty: to_before,
                    new_qty: to_after,
                },
            })
        });
        let transferred = transferred?;

        tracing::info!(
            transfer_id = %transferred.transfer_id,
            item_id = cmd.item_id,
            from = cmd.from_warehouse_id,
            to = cmd.to_warehouse_id,
            quantity = cmd.quantity,
            "stock transferred"
        );
        Ok(transferred)
    }
}
