use api_types::transfer::{TransferDone, TransferNew};
use axum::{Json, extract::State, http::StatusCode};
use engine::TransferStockCmd;

use crate::{
    ServerError,
    server::{ServerState, StockWriter},
};

pub async fn transfer(
    StockWriter(actor): StockWriter,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferDone>), ServerError> {
    let cmd = TransferStockCmd::new(
        payload.item_id,
        payload.from_warehouse_id,
        payload.to_warehouse_id,
        payload.quantity,
        payload.employee_id,
        payload.supplier_id,
    );

    let transferred = state.engine.transfer_stock(cmd).await?;
    tracing::debug!(
        actor_id = actor.id,
        transfer_id = %transferred.transfer_id,
        "transfer recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(TransferDone {
            ok: true,
            transfer_id: transferred.transfer_id,
            out_entry_id: transferred.out_entry_id,
            in_entry_id: transferred.in_entry_id,
            from_new_qty: transferred.from.new_qty,
            to_new_qty: transferred.to.new_qty,
        }),
    ))
}
