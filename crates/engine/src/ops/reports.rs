//! Read-only views derived from committed stock and ledger state.

use std::collections::{BTreeMap, HashMap};

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, MovementKind, PriceCents, ResultEngine, employees, items, ledger_entries,
    stock_rows, suppliers, warehouses,
};

use super::{Engine, require_warehouse, stock_row_not_found, with_tx};

/// Stock held by one warehouse. Values are in cents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseValue {
    pub warehouse_id: i32,
    pub location: String,
    pub distinct_items: u64,
    pub total_quantity: i64,
    pub total_value_cents: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockLine {
    pub item_id: i32,
    pub warehouse_id: i32,
    pub name: String,
    pub stock_quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPerformance {
    pub supplier_id: i32,
    pub name: String,
    /// Stock rows naming this supplier.
    pub stockings: u64,
    pub average_price_cents: i64,
    pub total_quantity: i64,
    pub total_value_cents: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub item_id: i32,
    pub warehouse_id: i32,
    pub name: String,
    pub category: String,
    pub price: PriceCents,
    pub stock_quantity: i64,
    pub line_value_cents: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeActivity {
    pub employee_id: i32,
    pub name: String,
    pub in_count: u64,
    pub out_count: u64,
    pub in_quantity: i64,
    pub out_quantity: i64,
}

impl Engine {
    /// Value held by every warehouse, most valuable first.
    pub async fn inventory_value(&self) -> ResultEngine<Vec<WarehouseValue>> {
        with_tx!(self, |db_tx| {
            let warehouses = warehouses::Entity::find()
                .order_by_asc(warehouses::Column::Id)
                .all(&db_tx)
                .await?;
            let rows = stock_rows::Entity::find().all(&db_tx).await?;

            let mut by_warehouse: HashMap<i32, Vec<stock_rows::Model>> = HashMap::new();
            for row in rows {
                by_warehouse.entry(row.warehouse_id).or_default().push(row);
            }

            let mut out: Vec<WarehouseValue> = warehouses
                .into_iter()
                .map(|w| {
                    let rows = by_warehouse.remove(&w.id).unwrap_or_default();
                    summarize_warehouse(w, &rows)
                })
                .collect();
            out.sort_by(|a, b| {
                b.total_value_cents
                    .cmp(&a.total_value_cents)
                    .then(a.warehouse_id.cmp(&b.warehouse_id))
            });
            Ok(out)
        })
    }

    pub async fn warehouse_value(&self, warehouse_id: i32) -> ResultEngine<WarehouseValue> {
        with_tx!(self, |db_tx| {
            let warehouse = require_warehouse(&db_tx, warehouse_id).await?;
            let rows = stock_rows::Entity::find()
                .filter(stock_rows::Column::WarehouseId.eq(warehouse_id))
                .all(&db_tx)
                .await?;
            Ok(summarize_warehouse(warehouse, &rows))
        })
    }

    /// Stock rows holding fewer than `threshold` units, emptiest first.
    pub async fn low_stock(&self, threshold: i64) -> ResultEngine<Vec<LowStockLine>> {
        require_threshold(threshold)?;
        let rows = stock_rows::Entity::find()
            .filter(stock_rows::Column::StockQuantity.lt(threshold))
            .find_also_related(items::Entity)
            .order_by_asc(stock_rows::Column::StockQuantity)
            .order_by_asc(stock_rows::Column::ItemId)
            .order_by_asc(stock_rows::Column::WarehouseId)
            .all(&self.database)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(row, item)| LowStockLine {
                item_id: row.item_id,
                warehouse_id: row.warehouse_id,
                name: item.map(|i| i.name).unwrap_or_default(),
                stock_quantity: row.stock_quantity,
            })
            .collect())
    }

    pub async fn is_low_stock(
        &self,
        item_id: i32,
        warehouse_id: i32,
        threshold: i64,
    ) -> ResultEngine<bool> {
        require_threshold(threshold)?;
        let row = stock_rows::Entity::find_by_id((item_id, warehouse_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| stock_row_not_found(item_id, warehouse_id))?;
        Ok(row.stock_quantity < threshold)
    }

    /// Units of an item across every warehouse.
    pub async fn total_item_stock(&self, item_id: i32) -> ResultEngine<i64> {
        items::Entity::find_by_id(item_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("item {item_id}")))?;
        let quantities: Vec<i64> = stock_rows::Entity::find()
            .select_only()
            .column(stock_rows::Column::StockQuantity)
            .filter(stock_rows::Column::ItemId.eq(item_id))
            .into_tuple()
            .all(&self.database)
            .await?;
        Ok(quantities.into_iter().sum())
    }

    /// Suppliers ranked by the value of the stock they supplied.
    pub async fn supplier_performance(&self) -> ResultEngine<Vec<SupplierPerformance>> {
        with_tx!(self, |db_tx| {
            let suppliers = suppliers::Entity::find().all(&db_tx).await?;
            let rows = stock_rows::Entity::find().all(&db_tx).await?;

            let mut by_supplier: HashMap<i32, Vec<stock_rows::Model>> = HashMap::new();
            for row in rows {
                by_supplier.entry(row.supplier_id).or_default().push(row);
            }

            let mut out: Vec<SupplierPerformance> = suppliers
                .into_iter()
                .map(|s| {
                    let rows = by_supplier.remove(&s.id).unwrap_or_default();
                    let stockings = rows.len() as u64;
                    let price_sum: i64 = rows.iter().map(|r| r.price_cents).sum();
                    SupplierPerformance {
                        supplier_id: s.id,
                        name: s.name,
                        stockings,
                        average_price_cents: if stockings == 0 {
                            0
                        } else {
                            price_sum / stockings as i64
                        },
                        total_quantity: rows.iter().map(|r| r.stock_quantity).sum(),
                        total_value_cents: rows.iter().map(line_value).sum(),
                    }
                })
                .collect();
            out.sort_by(|a, b| {
                b.total_value_cents
                    .cmp(&a.total_value_cents)
                    .then(a.supplier_id.cmp(&b.supplier_id))
            });
            Ok(out)
        })
    }

    /// First row of [`Engine::supplier_performance`], `None` without suppliers.
    pub async fn top_supplier(&self) -> ResultEngine<Option<SupplierPerformance>> {
        Ok(self.supplier_performance().await?.into_iter().next())
    }

    /// Stock rows with their item, optionally restricted to one warehouse.
    pub async fn inventory_report(
        &self,
        warehouse_id: Option<i32>,
    ) -> ResultEngine<Vec<InventoryLine>> {
        with_tx!(self, |db_tx| {
            let mut query = stock_rows::Entity::find()
                .find_also_related(items::Entity)
                .order_by_asc(stock_rows::Column::WarehouseId)
                .order_by_asc(stock_rows::Column::ItemId);
            if let Some(warehouse_id) = warehouse_id {
                require_warehouse(&db_tx, warehouse_id).await?;
                query = query.filter(stock_rows::Column::WarehouseId.eq(warehouse_id));
            }

            let mut out = Vec::new();
            for (row, item) in query.all(&db_tx).await? {
                let item = item.ok_or_else(|| {
                    EngineError::KeyNotFound(format!("item {}", row.item_id))
                })?;
                out.push(InventoryLine {
                    item_id: row.item_id,
                    warehouse_id: row.warehouse_id,
                    name: item.name,
                    category: item.category,
                    price: PriceCents::try_new(row.price_cents)?,
                    stock_quantity: row.stock_quantity,
                    line_value_cents: line_value(&row),
                });
            }
            Ok(out)
        })
    }

    /// Movement counts per employee, by employee id.
    pub async fn employee_summary(
        &self,
        employee_id: Option<i32>,
    ) -> ResultEngine<Vec<EmployeeActivity>> {
        with_tx!(self, |db_tx| {
            let mut employee_query =
                employees::Entity::find().order_by_asc(employees::Column::Id);
            let mut entry_query = ledger_entries::Entity::find()
                .select_only()
                .column(ledger_entries::Column::EmployeeId)
                .column(ledger_entries::Column::Kind)
                .column(ledger_entries::Column::Quantity);
            if let Some(employee_id) = employee_id {
                employee_query = employee_query.filter(employees::Column::Id.eq(employee_id));
                entry_query = entry_query.filter(ledger_entries::Column::EmployeeId.eq(employee_id));
            }

            let employees = employee_query.all(&db_tx).await?;
            if let Some(employee_id) = employee_id
                && employees.is_empty()
            {
                return Err(EngineError::KeyNotFound(format!("employee {employee_id}")));
            }

            let mut activity: BTreeMap<i32, EmployeeActivity> = employees
                .into_iter()
                .map(|e| {
                    (
                        e.id,
                        EmployeeActivity {
                            employee_id: e.id,
                            name: e.name,
                            ..EmployeeActivity::default()
                        },
                    )
                })
                .collect();

            let entries: Vec<(i32, String, i64)> = entry_query.into_tuple().all(&db_tx).await?;
            for (employee_id, kind, quantity) in entries {
                let Some(summary) = activity.get_mut(&employee_id) else {
                    continue;
                };
                match MovementKind::try_from(kind.as_str())? {
                    MovementKind::In => {
                        summary.in_count += 1;
                        summary.in_quantity += quantity;
                    }
                    MovementKind::Out => {
                        summary.out_count += 1;
                        summary.out_quantity += quantity;
                    }
                }
            }

            Ok(activity.into_values().collect())
        })
    }
}

fn line_value(row: &stock_rows::Model) -> i64 {
    row.price_cents.saturating_mul(row.stock_quantity)
}

fn summarize_warehouse(warehouse: warehouses::Model, rows: &[stock_rows::Model]) -> WarehouseValue {
    WarehouseValue {
        warehouse_id: warehouse.id,
        location: warehouse.location,
        distinct_items: rows.len() as u64,
        total_quantity: rows.iter().map(|r| r.stock_quantity).sum(),
        total_value_cents: rows.iter().map(line_value).sum(),
    }
}

fn require_threshold(threshold: i64) -> ResultEngine<()> {
    if threshold < 0 {
        return Err(EngineError::Validation(
            "threshold must be >= 0".to_string(),
        ));
    }
    Ok(())
}
