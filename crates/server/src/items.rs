use api_types::item::ItemView;
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState, stockings::stock_row_view};

/// An item with every stock row holding it.
pub async fn get(
    State(state): State<ServerState>,
    Path(item_id): Path<i32>,
) -> Result<Json<ItemView>, ServerError> {
    let item = state.engine.item(item_id).await?;
    let rows = state.engine.item_stock_rows(item_id).await?;
    let total_stock = state.engine.total_item_stock(item_id).await?;

    Ok(Json(ItemView {
        id: item.id,
        name: item.name,
        category: item.category,
        total_stock,
        stockings: rows.into_iter().map(stock_row_view).collect(),
    }))
}
