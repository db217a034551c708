//! Stocking endpoints: an item held in one warehouse.

use api_types::stocking::{
    StockReplayView, StockRowView, StockingCreated, StockingNew, StockingUpdate,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CreateStockingCmd, PriceCents, StockReplay, StockRow, UpdateStockingCmd};

use crate::{
    ServerError,
    server::{ServerState, StockWriter},
};

pub(crate) fn stock_row_view(row: StockRow) -> StockRowView {
    StockRowView {
        item_id: row.item_id,
        warehouse_id: row.warehouse_id,
        price_minor: row.price.cents(),
        stock_quantity: row.stock_quantity,
        opening_quantity: row.opening_quantity,
        supplier_id: row.supplier_id,
    }
}

pub async fn create(
    StockWriter(actor): StockWriter,
    State(state): State<ServerState>,
    Json(payload): Json<StockingNew>,
) -> Result<(StatusCode, Json<StockingCreated>), ServerError> {
    let cmd = CreateStockingCmd::new(
        payload.name,
        payload.category,
        payload.warehouse_id,
        payload.supplier_id,
    )
    .price(PriceCents::try_new(payload.price_minor)?)
    .quantity(payload.quantity);

    let created = state.engine.create_stocking(cmd).await?;
    tracing::debug!(actor_id = actor.id, item_id = created.item_id, "stocking created");

    Ok((
        StatusCode::CREATED,
        Json(StockingCreated {
            item_id: created.item_id,
            warehouse_id: created.warehouse_id,
            is_new_item: created.is_new_item,
            category: created.category,
        }),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Path((item_id, warehouse_id)): Path<(i32, i32)>,
) -> Result<Json<StockRowView>, ServerError> {
    let row = state.engine.stock_row(item_id, warehouse_id).await?;
    Ok(Json(stock_row_view(row)))
}

pub async fn update(
    StockWriter(_actor): StockWriter,
    State(state): State<ServerState>,
    Path((item_id, warehouse_id)): Path<(i32, i32)>,
    Json(payload): Json<StockingUpdate>,
) -> Result<Json<StockRowView>, ServerError> {
    let mut cmd = UpdateStockingCmd::new(item_id, warehouse_id);
    if let Some(price_minor) = payload.price_minor {
        cmd = cmd.price(PriceCents::try_new(price_minor)?);
    }
    if let Some(supplier_id) = payload.supplier_id {
        cmd = cmd.supplier_id(supplier_id);
    }

    let row = state.engine.update_stocking(cmd).await?;
    Ok(Json(stock_row_view(row)))
}

pub async fn remove(
    StockWriter(_actor): StockWriter,
    State(state): State<ServerState>,
    Path((item_id, warehouse_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_stocking(item_id, warehouse_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replay(
    State(state): State<ServerState>,
    Path((item_id, warehouse_id)): Path<(i32, i32)>,
) -> Result<Json<StockReplayView>, ServerError> {
    let StockReplay {
        item_id,
        warehouse_id,
        opening_quantity,
        recorded_quantity,
        replayed_quantity,
        entries,
        lowest_quantity,
        consistent,
    } = state.engine.replay_stock(item_id, warehouse_id).await?;

    Ok(Json(StockReplayView {
        item_id,
        warehouse_id,
        opening_quantity,
        recorded_quantity,
        replayed_quantity,
        entries,
        lowest_quantity,
        consistent,
    }))
}
