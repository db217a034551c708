use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    BulkAdjustPricesCmd, EngineError, PriceCents, ResultEngine, items, stock_rows,
    util::category_key,
};

use super::{Engine, claim_write_lock, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricesAdjusted {
    /// Stock rows whose price was rewritten, always at least one.
    pub rows_affected: u64,
}

impl Engine {
    /// Scales the price of every stock row of every item in a category.
    ///
    /// The category is matched case-insensitively. All matching rows change in
    /// one transaction; a price that would overflow aborts the whole batch.
    /// A category with no stock rows is rejected as invalid input.
    pub async fn bulk_adjust_prices(&self, cmd: BulkAdjustPricesCmd) -> ResultEngine<PricesAdjusted> {
        let key = category_key(&cmd.category)?;

        let adjusted: ResultEngine<PricesAdjusted> = with_tx!(self, |db_tx| {
            claim_write_lock(&db_tx).await?;
            let categories: Vec<(i32, String)> = items::Entity::find()
                .select_only()
                .column(items::Column::Id)
                .column(items::Column::Category)
                .into_tuple()
                .all(&db_tx)
                .await?;
            let item_ids: Vec<i32> = categories
                .into_iter()
                .filter(|(_, category)| category_key(category).is_ok_and(|k| k == key))
                .map(|(id, _)| id)
                .collect();

            let rows = if item_ids.is_empty() {
                Vec::new()
            } else {
                stock_rows::Entity::find()
                    .filter(stock_rows::Column::ItemId.is_in(item_ids))
                    .order_by_asc(stock_rows::Column::WarehouseId)
                    .order_by_asc(stock_rows::Column::ItemId)
                    .lock_exclusive()
                    .all(&db_tx)
                    .await?
            };
            if rows.is_empty() {
                tracing::debug!(category = %cmd.category, "price adjustment refused: no stock rows");
                return Err(EngineError::Validation(format!(
                    "no stock rows in category {}",
                    cmd.category.trim()
                )));
            }

            let mut rows_affected = 0;
            for row in rows {
                let price = PriceCents::try_new(row.price_cents)?.adjusted(cmd.change)?;
                let mut active: stock_rows::ActiveModel = row.into();
                active.price_cents = ActiveValue::Set(price.cents());
                active.update(&db_tx).await?;
                rows_affected += 1;
            }

            Ok(PricesAdjusted { rows_affected })
        });
        let adjusted = adjusted?;

        tracing::info!(
            category = %cmd.category,
            change = %cmd.change,
            rows = adjusted.rows_affected,
            "prices adjusted"
        );
        Ok(adjusted)
    }
}
