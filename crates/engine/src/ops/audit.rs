use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{LedgerEntry, ResultEngine, ledger_entries, stock_rows};

use super::{Engine, stock_row_not_found};

/// Result of replaying a stock row's ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReplay {
    pub item_id: i32,
    pub warehouse_id: i32,
    pub opening_quantity: i64,
    /// Quantity currently stored on the row.
    pub recorded_quantity: i64,
    /// Quantity obtained by applying every entry to `opening_quantity`.
    pub replayed_quantity: i64,
    pub entries: u64,
    /// Smallest running quantity seen during the replay.
    pub lowest_quantity: i64,
    pub consistent: bool,
}

impl Engine {
    /// Replays a stock row's ledger entries in time order, starting from the
    /// quantity the row was created with.
    ///
    /// The row is consistent when the replay lands on the stored quantity and
    /// never dips below zero on the way.
    pub async fn replay_stock(&self, item_id: i32, warehouse_id: i32) -> ResultEngine<StockReplay> {
        let row = stock_rows::Entity::find_by_id((item_id, warehouse_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| stock_row_not_found(item_id, warehouse_id))?;

        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::ItemId.eq(item_id))
            .filter(ledger_entries::Column::WarehouseId.eq(warehouse_id))
            .order_by_asc(ledger_entries::Column::OccurredAt)
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.database)
            .await?;

        let mut running = row.opening_quantity;
        let mut lowest = running;
        let mut entries = 0;
        for model in models {
            let entry = LedgerEntry::try_from(model)?;
            running += entry.delta();
            lowest = lowest.min(running);
            entries += 1;
        }

        let consistent = running == row.stock_quantity && lowest >= 0;
        if !consistent {
            tracing::warn!(
                item_id,
                warehouse_id,
                recorded = row.stock_quantity,
                replayed = running,
                lowest,
                "stock row does not match its ledger"
            );
        }

        Ok(StockReplay {
            item_id,
            warehouse_id,
            opening_quantity: row.opening_quantity,
            recorded_quantity: row.stock_quantity,
            replayed_quantity: running,
            entries,
            lowest_quantity: lowest,
            consistent,
        })
    }
}
