use std::collections::BTreeMap;

use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    Counterparty, EngineError, LedgerEntry, MovementKind, RecordMovementCmd, ResultEngine,
    ledger_entries::{self, NewEntry},
    util::require_positive_quantity,
};

use super::{
    Engine, apply_stock_delta, claim_write_lock, current_quantity, require_customer,
    require_employee, require_stock_row_locked, require_supplier, with_tx,
};

/// Outcome of [`Engine::record_movement`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecorded {
    pub transaction_id: i32,
    pub previous_qty: i64,
    pub new_qty: i64,
}

/// Outcome of [`Engine::reverse_movement`], for the stock row of the
/// requested entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReversed {
    pub previous_qty: i64,
    pub new_qty: i64,
    /// Ids of every entry removed. A transfer leg takes its peer with it.
    pub reversed_entry_ids: Vec<i32>,
}

/// Filters for listing ledger entries. Unset fields match everything.
#[derive(Clone, Debug, Default)]
pub struct LedgerFilter {
    pub item_id: Option<i32>,
    pub warehouse_id: Option<i32>,
    pub employee_id: Option<i32>,
    pub kind: Option<MovementKind>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LedgerCursor {
    entry_id: i32,
}

impl LedgerCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::Validation("invalid ledger cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::Validation("invalid ledger cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::Validation("invalid ledger cursor".to_string()))
    }
}

/// The single counterparty a movement of `kind` must name.
fn movement_counterparty(cmd: &RecordMovementCmd) -> ResultEngine<Counterparty> {
    match (cmd.kind, cmd.customer_id, cmd.supplier_id) {
        (MovementKind::Out, Some(customer_id), None) => Ok(Counterparty::Customer(customer_id)),
        (MovementKind::In, None, Some(supplier_id)) => Ok(Counterparty::Supplier(supplier_id)),
        (MovementKind::Out, _, _) => Err(EngineError::Validation(
            "OUT movements require a customer and no supplier".to_string(),
        )),
        (MovementKind::In, _, _) => Err(EngineError::Validation(
            "IN movements require a supplier and no customer".to_string(),
        )),
    }
}

impl Engine {
    /// Applies one `IN`/`OUT` movement to a stock row.
    ///
    /// The entry insert and the quantity change commit together. An `OUT`
    /// larger than the current quantity fails with
    /// [`EngineError::InsufficientStock`] and changes nothing.
    pub async fn record_movement(&self, cmd: RecordMovementCmd) -> ResultEngine<MovementRecorded> {
        require_positive_quantity(cmd.quantity)?;
        let counterparty = movement_counterparty(&cmd)?;

        let recorded: ResultEngine<MovementRecorded> = with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            let row = require_stock_row_locked(&db_tx, cmd.item_id, cmd.warehouse_id).await?;
            require_employee(&db_tx, cmd.employee_id).await?;
            match counterparty {
                Counterparty::Customer(id) => {
                    require_customer(&db_tx, id).await?;
                }
                Counterparty::Supplier(id) => {
                    require_supplier(&db_tx, id).await?;
                }
                Counterparty::Warehouse(_) => {}
            }

            if cmd.kind == MovementKind::Out && cmd.quantity > row.stock_quantity {
                tracing::debug!(
                    item_id = cmd.item_id,
                    warehouse_id = cmd.warehouse_id,
                    available = row.stock_quantity,
                    requested = cmd.quantity,
                    "movement refused: insufficient stock"
                );
                return Err(EngineError::InsufficientStock {
                    available: row.stock_quantity,
                    requested: cmd.quantity,
                });
            }

            let entry = NewEntry {
                kind: cmd.kind,
                item_id: cmd.item_id,
                warehouse_id: cmd.warehouse_id,
                quantity: cmd.quantity,
                employee_id: cmd.employee_id,
                counterparty,
                transfer_id: None,
                occurred_at: Utc::now(),
            };
            let inserted = ledger_entries::ActiveModel::from(&entry)
                .insert(&db_tx)
                .await?;

            let delta = cmd.kind.signed(cmd.quantity);
            let Some(new_qty) =
                apply_stock_delta(&db_tx, cmd.item_id, cmd.warehouse_id, delta).await?
            else {
                let available = current_quantity(&db_tx, cmd.item_id, cmd.warehouse_id).await?;
                return Err(EngineError::InsufficientStock {
                    available,
                    requested: cmd.quantity,
                });
            };

            Ok(MovementRecorded {
                transaction_id: inserted.id,
                previous_qty: new_qty - delta,
                new_qty,
            })
        });
        let recorded = recorded?;

        tracing::info!(
            entry_id = recorded.transaction_id,
            item_id = cmd.item_id,
            warehouse_id = cmd.warehouse_id,
            kind = cmd.kind.as_str(),
            quantity = cmd.quantity,
            new_qty = recorded.new_qty,
            "movement recorded"
        );
        Ok(recorded)
    }

    /// Deletes a ledger entry and undoes its effect on stock.
    ///
    /// Reversing one leg of a transfer reverses both legs. Fails with
    /// [`EngineError::WouldGoNegative`] when undoing an `IN` would leave less
    /// than zero units, e.g. because the stock was sold in the meantime.
    pub async fn reverse_movement(&self, entry_id: i32) -> ResultEngine<MovementReversed> {
        let reversed: ResultEngine<MovementReversed> = with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            let model = ledger_entries::Entity::find_by_id(entry_id)
                .lock_exclusive()
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("ledger entry {entry_id}")))?;
            let target = LedgerEntry::try_from(model)?;

            let entries = match target.transfer_id {
                Some(transfer_id) => ledger_entries::Entity::find()
                    .filter(ledger_entries::Column::TransferId.eq(transfer_id.to_string()))
                    .order_by_asc(ledger_entries::Column::Id)
                    .lock_exclusive()
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(LedgerEntry::try_from)
                    .collect::<ResultEngine<Vec<_>>>()?,
                None => vec![target.clone()],
            };

            // Net effect per row, keyed (warehouse, item) so rows lock in a
            // global order.
            let mut undo: BTreeMap<(i32, i32), i64> = BTreeMap::new();
            for entry in &entries {
                *undo.entry((entry.warehouse_id, entry.item_id)).or_default() -= entry.delta();
            }

            let mut target_change = None;
            for (&(warehouse_id, item_id), &delta) in &undo {
                let row = require_stock_row_locked(&db_tx, item_id, warehouse_id).await?;
                let restored = row.stock_quantity + delta;
                if restored < 0 {
                    tracing::debug!(entry_id, current = row.stock_quantity, restored, "reversal refused");
                    return Err(EngineError::WouldGoNegative {
                        current: row.stock_quantity,
                        restored,
                    });
                }
                let new_qty = apply_stock_delta(&db_tx, item_id, warehouse_id, delta)
                    .await?
                    .ok_or(EngineError::WouldGoNegative {
                        current: row.stock_quantity,
                        restored,
                    })?;
                if (warehouse_id, item_id) == (target.warehouse_id, target.item_id) {
                    target_change = Some((row.stock_quantity, new_qty));
                }
            }

            let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
            ledger_entries::Entity::delete_many()
                .filter(ledger_entries::Column::Id.is_in(ids.clone()))
                .exec(&db_tx)
                .await?;

            let (previous_qty, new_qty) = target_change.ok_or_else(|| {
                EngineError::KeyNotFound(format!("stock row of ledger entry {entry_id}"))
            })?;
            Ok(MovementReversed {
                previous_qty,
                new_qty,
                reversed_entry_ids: ids,
            })
        });
        let reversed = reversed?;

        tracing::info!(
            entry_id,
            reversed = reversed.reversed_entry_ids.len(),
            new_qty = reversed.new_qty,
            "movement reversed"
        );
        Ok(reversed)
    }

    pub async fn ledger_entry(&self, entry_id: i32) -> ResultEngine<LedgerEntry> {
        let model = ledger_entries::Entity::find_by_id(entry_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("ledger entry {entry_id}")))?;
        LedgerEntry::try_from(model)
    }

    /// Both legs of a transfer, source leg first.
    pub async fn transfer_entries(&self, transfer_id: Uuid) -> ResultEngine<Vec<LedgerEntry>> {
        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TransferId.eq(transfer_id.to_string()))
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.database)
            .await?;
        if models.is_empty() {
            return Err(EngineError::KeyNotFound(format!("transfer {transfer_id}")));
        }
        models.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Lists ledger entries newest first, with cursor-based pagination.
    pub async fn ledger_entries(
        &self,
        filter: &LedgerFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<LedgerPage> {
        if limit == 0 {
            return Err(EngineError::Validation("limit must be > 0".to_string()));
        }

        let mut query = ledger_entries::Entity::find()
            .order_by_desc(ledger_entries::Column::Id)
            .limit(limit.saturating_add(1));
        if let Some(item_id) = filter.item_id {
            query = query.filter(ledger_entries::Column::ItemId.eq(item_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(ledger_entries::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(ledger_entries::Column::EmployeeId.eq(employee_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(ledger_entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(cursor) = cursor {
            let cursor = LedgerCursor::decode(cursor)?;
            query = query.filter(ledger_entries::Column::Id.lt(cursor.entry_id));
        }

        let models = query.all(&self.database).await?;
        let has_more = models.len() as u64 > limit;
        let entries = models
            .into_iter()
            .take(limit as usize)
            .map(LedgerEntry::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = match entries.last() {
            Some(last) if has_more => Some(LedgerCursor { entry_id: last.id }.encode()?),
            _ => None,
        };
        Ok(LedgerPage {
            entries,
            next_cursor,
        })
    }
}
