use sea_orm::{DatabaseConnection, DbBackend, QuerySelect, prelude::*, sea_query::Expr};

use crate::{EngineError, ResultEngine, customers, employees, stock_rows, suppliers, warehouses};

mod audit;
mod directory;
mod ledger;
mod prices;
mod reports;
mod stockings;
mod transfer;

pub use audit::StockReplay;
pub use ledger::{LedgerFilter, LedgerPage, MovementRecorded, MovementReversed};
pub use prices::PricesAdjusted;
pub use reports::{
    EmployeeActivity, InventoryLine, LowStockLine, SupplierPerformance, WarehouseValue,
};
pub use stockings::StockingCreated;
pub use transfer::{QuantityChange, StockTransferred};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = $tx.rollback().await {
                    tracing::warn!("rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Take the store's write lock before a mutating transaction reads anything.
///
/// SQLite waits out a busy database only when the first lock a transaction
/// asks for is the write lock. Upgrading a read lock fails at once with
/// `SQLITE_BUSY`, so every writer starts with an update that matches no row.
/// Postgres relies on the row locks taken by [`lock_stock_row`] instead.
pub(super) async fn claim_write_lock<C: ConnectionTrait>(db: &C) -> ResultEngine<()> {
    if db.get_database_backend() != DbBackend::Sqlite {
        return Ok(());
    }
    stock_rows::Entity::update_many()
        .col_expr(
            stock_rows::Column::StockQuantity,
            Expr::col(stock_rows::Column::StockQuantity).into(),
        )
        .filter(Expr::val(1).eq(0))
        .exec(db)
        .await?;
    Ok(())
}

/// Load a stock row and hold its write lock until the transaction ends.
///
/// SQLite has no row locks; there [`claim_write_lock`] already holds the
/// database lock, and the guarded update in [`apply_stock_delta`] keeps the
/// quantity from going negative.
pub(super) async fn lock_stock_row<C: ConnectionTrait>(
    db: &C,
    item_id: i32,
    warehouse_id: i32,
) -> ResultEngine<Option<stock_rows::Model>> {
    let row = stock_rows::Entity::find()
        .filter(stock_rows::Column::ItemId.eq(item_id))
        .filter(stock_rows::Column::WarehouseId.eq(warehouse_id))
        .lock_exclusive()
        .one(db)
        .await?;
    Ok(row)
}

pub(super) async fn require_stock_row_locked<C: ConnectionTrait>(
    db: &C,
    item_id: i32,
    warehouse_id: i32,
) -> ResultEngine<stock_rows::Model> {
    lock_stock_row(db, item_id, warehouse_id)
        .await?
        .ok_or_else(|| stock_row_not_found(item_id, warehouse_id))
}

pub(super) fn stock_row_not_found(item_id: i32, warehouse_id: i32) -> EngineError {
    EngineError::KeyNotFound(format!(
        "item {item_id} is not stocked in warehouse {warehouse_id}"
    ))
}

/// Add `delta` to a stock row's quantity.
///
/// Decrements only apply while the row still holds at least `-delta` units.
/// Returns the new quantity, or `None` when that guard refused the write.
pub(super) async fn apply_stock_delta<C: ConnectionTrait>(
    db: &C,
    item_id: i32,
    warehouse_id: i32,
    delta: i64,
) -> ResultEngine<Option<i64>> {
    let mut update = stock_rows::Entity::update_many()
        .col_expr(
            stock_rows::Column::StockQuantity,
            Expr::col(stock_rows::Column::StockQuantity).add(delta),
        )
        .filter(stock_rows::Column::ItemId.eq(item_id))
        .filter(stock_rows::Column::WarehouseId.eq(warehouse_id));
    if delta < 0 {
        update = update.filter(stock_rows::Column::StockQuantity.gte(-delta));
    }
    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }

    let row = stock_rows::Entity::find_by_id((item_id, warehouse_id))
        .one(db)
        .await?
        .ok_or_else(|| stock_row_not_found(item_id, warehouse_id))?;
    Ok(Some(row.stock_quantity))
}

/// Current quantity, read without locking.
pub(super) async fn current_quantity<C: ConnectionTrait>(
    db: &C,
    item_id: i32,
    warehouse_id: i32,
) -> ResultEngine<i64> {
    let row = stock_rows::Entity::find_by_id((item_id, warehouse_id))
        .one(db)
        .await?
        .ok_or_else(|| stock_row_not_found(item_id, warehouse_id))?;
    Ok(row.stock_quantity)
}

pub(super) async fn require_warehouse<C: ConnectionTrait>(
    db: &C,
    warehouse_id: i32,
) -> ResultEngine<warehouses::Model> {
    warehouses::Entity::find_by_id(warehouse_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("warehouse {warehouse_id}")))
}

pub(super) async fn require_supplier<C: ConnectionTrait>(
    db: &C,
    supplier_id: i32,
) -> ResultEngine<suppliers::Model> {
    suppliers::Entity::find_by_id(supplier_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("supplier {supplier_id}")))
}

pub(super) async fn require_employee<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
) -> ResultEngine<employees::Model> {
    employees::Entity::find_by_id(employee_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("employee {employee_id}")))
}

pub(super) async fn require_customer<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
) -> ResultEngine<customers::Model> {
    customers::Entity::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("customer {customer_id}")))
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
