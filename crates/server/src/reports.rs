//! Read-only reports.

use api_types::report::{
    EmployeeActivityView, EmployeeQuery, InventoryLineView, InventoryQuery, LowStockView,
    SupplierPerformanceView, WarehouseValueView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::{EmployeeActivity, InventoryLine, LowStockLine, SupplierPerformance, WarehouseValue};

use crate::{ServerError, server::ServerState};

fn warehouse_value_view(value: WarehouseValue) -> WarehouseValueView {
    WarehouseValueView {
        warehouse_id: value.warehouse_id,
        location: value.location,
        distinct_items: value.distinct_items,
        total_quantity: value.total_quantity,
        total_value_minor: value.total_value_cents,
    }
}

fn supplier_view(perf: SupplierPerformance) -> SupplierPerformanceView {
    SupplierPerformanceView {
        supplier_id: perf.supplier_id,
        name: perf.name,
        stockings: perf.stockings,
        average_price_minor: perf.average_price_cents,
        total_quantity: perf.total_quantity,
        total_value_minor: perf.total_value_cents,
    }
}

pub async fn inventory_value(
    State(state): State<ServerState>,
) -> Result<Json<Vec<WarehouseValueView>>, ServerError> {
    let values = state.engine.inventory_value().await?;
    Ok(Json(values.into_iter().map(warehouse_value_view).collect()))
}

pub async fn warehouse_value(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<WarehouseValueView>, ServerError> {
    let value = state.engine.warehouse_value(id).await?;
    Ok(Json(warehouse_value_view(value)))
}

pub async fn low_stock(
    State(state): State<ServerState>,
    Path(threshold): Path<i64>,
) -> Result<Json<Vec<LowStockView>>, ServerError> {
    let lines = state.engine.low_stock(threshold).await?;
    Ok(Json(
        lines
            .into_iter()
            .map(
                |LowStockLine {
                     item_id,
                     warehouse_id,
                     name,
                     stock_quantity,
                 }| LowStockView {
                    item_id,
                    warehouse_id,
                    name,
                    stock_quantity,
                },
            )
            .collect(),
    ))
}

pub async fn supplier_performance(
    State(state): State<ServerState>,
) -> Result<Json<Vec<SupplierPerformanceView>>, ServerError> {
    let perf = state.engine.supplier_performance().await?;
    Ok(Json(perf.into_iter().map(supplier_view).collect()))
}

/// `null` when no supplier is registered.
pub async fn top_supplier(
    State(state): State<ServerState>,
) -> Result<Json<Option<SupplierPerformanceView>>, ServerError> {
    let top = state.engine.top_supplier().await?;
    Ok(Json(top.map(supplier_view)))
}

pub async fn inventory(
    State(state): State<ServerState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<Vec<InventoryLineView>>, ServerError> {
    let lines = state.engine.inventory_report(query.warehouse_id).await?;
    Ok(Json(
        lines
            .into_iter()
            .map(|line: InventoryLine| InventoryLineView {
                item_id: line.item_id,
                warehouse_id: line.warehouse_id,
                name: line.name,
                category: line.category,
                price_minor: line.price.cents(),
                stock_quantity: line.stock_quantity,
                line_value_minor: line.line_value_cents,
            })
            .collect(),
    ))
}

pub async fn employees(
    State(state): State<ServerState>,
    Query(query): Query<EmployeeQuery>,
) -> Result<Json<Vec<EmployeeActivityView>>, ServerError> {
    let summary = state.engine.employee_summary(query.employee_id).await?;
    Ok(Json(
        summary
            .into_iter()
            .map(|a: EmployeeActivity| EmployeeActivityView {
                employee_id: a.employee_id,
                name: a.name,
                in_count: a.in_count,
                out_count: a.out_count,
                in_quantity: a.in_quantity,
                out_quantity: a.out_quantity,
            })
            .collect(),
    ))
}
