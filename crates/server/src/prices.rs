use api_types::price::{PriceAdjust, PriceAdjusted};
use axum::{Json, extract::State};
use engine::{BulkAdjustPricesCmd, PercentChange};

use crate::{
    ServerError,
    server::{ServerState, StockWriter},
};

/// Scales every price in a category by a signed percentage.
pub async fn adjust(
    StockWriter(actor): StockWriter,
    State(state): State<ServerState>,
    Json(payload): Json<PriceAdjust>,
) -> Result<Json<PriceAdjusted>, ServerError> {
    let change: PercentChange = payload.percent.parse()?;
    let adjusted = state
        .engine
        .bulk_adjust_prices(BulkAdjustPricesCmd::new(payload.category, change))
        .await?;
    tracing::debug!(
        actor_id = actor.id,
        rows = adjusted.rows_affected,
        "prices adjusted"
    );

    Ok(Json(PriceAdjusted {
        rows_affected: adjusted.rows_affected,
    }))
}
