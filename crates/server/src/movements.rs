//! Stock movements and the ledger.

use api_types::movement::{
    LedgerEntryView, LedgerPageView, LedgerQuery, MovementNew, MovementRecorded, MovementReversed,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{Counterparty, LedgerEntry, LedgerFilter, MovementKind, RecordMovementCmd};

use crate::{
    ServerError,
    server::{ServerState, StockWriter},
};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

fn entry_view(entry: LedgerEntry) -> LedgerEntryView {
    let (customer_id, supplier_id, peer_warehouse_id) = match entry.counterparty {
        Counterparty::Customer(id) => (Some(id), None, None),
        Counterparty::Supplier(id) => (None, Some(id), None),
        Counterparty::Warehouse(id) => (None, None, Some(id)),
    };
    LedgerEntryView {
        id: entry.id,
        kind: entry.kind.as_str().to_string(),
        item_id: entry.item_id,
        warehouse_id: entry.warehouse_id,
        quantity: entry.quantity,
        employee_id: entry.employee_id,
        customer_id,
        supplier_id,
        peer_warehouse_id,
        transfer_id: entry.transfer_id,
        occurred_at: entry.occurred_at,
    }
}

pub async fn record(
    StockWriter(actor): StockWriter,
    State(state): State<ServerState>,
    Json(payload): Json<MovementNew>,
) -> Result<(StatusCode, Json<MovementRecorded>), ServerError> {
    let kind = MovementKind::try_from(payload.kind.as_str())?;
    let mut cmd = RecordMovementCmd::new(
        kind,
        payload.item_id,
        payload.warehouse_id,
        payload.quantity,
        payload.employee_id,
    );
    if let Some(customer_id) = payload.customer_id {
        cmd = cmd.customer_id(customer_id);
    }
    if let Some(supplier_id) = payload.supplier_id {
        cmd = cmd.supplier_id(supplier_id);
    }

    let recorded = state.engine.record_movement(cmd).await?;
    tracing::debug!(
        actor_id = actor.id,
        role = actor.role.as_str(),
        transaction_id = recorded.transaction_id,
        "movement recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(MovementRecorded {
            transaction_id: recorded.transaction_id,
            previous_qty: recorded.previous_qty,
            new_qty: recorded.new_qty,
        }),
    ))
}

pub async fn reverse(
    StockWriter(actor): StockWriter,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<MovementReversed>, ServerError> {
    let reversed = state.engine.reverse_movement(id).await?;
    tracing::debug!(actor_id = actor.id, entry_id = id, "movement reversed");

    Ok(Json(MovementReversed {
        previous_qty: reversed.previous_qty,
        new_qty: reversed.new_qty,
        reversed_entry_ids: reversed.reversed_entry_ids,
    }))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<LedgerPageView>, ServerError> {
    let kind = query
        .kind
        .as_deref()
        .map(MovementKind::try_from)
        .transpose()?;
    let filter = LedgerFilter {
        item_id: query.item_id,
        warehouse_id: query.warehouse_id,
        employee_id: query.employee_id,
        kind,
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let page = state
        .engine
        .ledger_entries(&filter, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(LedgerPageView {
        entries: page.entries.into_iter().map(entry_view).collect(),
        next_cursor: page.next_cursor,
    }))
}
