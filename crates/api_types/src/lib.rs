use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// One of `validation`, `not_found`, `conflict`, `unavailable`,
    /// `internal`, `forbidden`, `unauthorized`, `bad_request`.
    pub kind: String,
    /// Units on hand, for insufficient stock failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

pub mod stocking {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockingNew {
        pub name: String,
        pub category: String,
        pub warehouse_id: i32,
        /// Unit price in cents, must be >= 0.
        pub price_minor: i64,
        pub quantity: i64,
        pub supplier_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockingCreated {
        pub item_id: i32,
        pub warehouse_id: i32,
        pub is_new_item: bool,
        /// Category of the item, which wins over the requested one when the
        /// item already existed.
        pub category: String,
    }

    /// At least one field must be set.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StockingUpdate {
        pub price_minor: Option<i64>,
        pub supplier_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockRowView {
        pub item_id: i32,
        pub warehouse_id: i32,
        pub price_minor: i64,
        pub stock_quantity: i64,
        pub opening_quantity: i64,
        pub supplier_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockReplayView {
        pub item_id: i32,
        pub warehouse_id: i32,
        pub opening_quantity: i64,
        pub recorded_quantity: i64,
        pub replayed_quantity: i64,
        pub entries: u64,
        pub lowest_quantity: i64,
        pub consistent: bool,
    }
}

pub mod item {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemView {
        pub id: i32,
        pub name: String,
        pub category: String,
        /// Units across every warehouse.
        pub total_stock: i64,
        pub stockings: Vec<stocking::StockRowView>,
    }
}

pub mod movement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementNew {
        /// `IN` or `OUT`.
        #[serde(rename = "type")]
        pub kind: String,
        pub item_id: i32,
        pub warehouse_id: i32,
        pub quantity: i64,
        pub employee_id: i32,
        /// Required for `OUT`.
        pub customer_id: Option<i32>,
        /// Required for `IN`.
        pub supplier_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementRecorded {
        pub transaction_id: i32,
        pub previous_qty: i64,
        pub new_qty: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementReversed {
        pub previous_qty: i64,
        pub new_qty: i64,
        pub reversed_entry_ids: Vec<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LedgerQuery {
        pub item_id: Option<i32>,
        pub warehouse_id: Option<i32>,
        pub employee_id: Option<i32>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor, from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerEntryView {
        pub id: i32,
        #[serde(rename = "type")]
        pub kind: String,
        pub item_id: i32,
        pub warehouse_id: i32,
        pub quantity: i64,
        pub employee_id: i32,
        pub customer_id: Option<i32>,
        pub supplier_id: Option<i32>,
        pub peer_warehouse_id: Option<i32>,
        pub transfer_id: Option<Uuid>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerPageView {
        pub entries: Vec<LedgerEntryView>,
        /// Cursor for the next (older) page.
        pub next_cursor: Option<String>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub item_id: i32,
        pub from_warehouse_id: i32,
        pub to_warehouse_id: i32,
        pub quantity: i64,
        pub employee_id: i32,
        /// Recorded on the destination row if it has to be created.
        pub supplier_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferDone {
        pub ok: bool,
        pub transfer_id: Uuid,
        pub out_entry_id: i32,
        pub in_entry_id: i32,
        pub from_new_qty: i64,
        pub to_new_qty: i64,
    }
}

pub mod price {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceAdjust {
        pub category: String,
        /// Decimal percentage, e.g. `"10"` or `"-12.5"`. At most two decimals,
        /// never below `-100`.
        pub percent: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PriceAdjusted {
        pub rows_affected: u64,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WarehouseValueView {
        pub warehouse_id: i32,
        pub location: String,
        pub distinct_items: u64,
        pub total_quantity: i64,
        pub total_value_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LowStockView {
        pub item_id: i32,
        pub warehouse_id: i32,
        pub name: String,
        pub stock_quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SupplierPerformanceView {
        pub supplier_id: i32,
        pub name: String,
        pub stockings: u64,
        pub average_price_minor: i64,
        pub total_quantity: i64,
        pub total_value_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InventoryLineView {
        pub item_id: i32,
        pub warehouse_id: i32,
        pub name: String,
        pub category: String,
        pub price_minor: i64,
        pub stock_quantity: i64,
        pub line_value_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EmployeeActivityView {
        pub employee_id: i32,
        pub name: String,
        pub in_count: u64,
        pub out_count: u64,
        pub in_quantity: i64,
        pub out_quantity: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct InventoryQuery {
        pub warehouse_id: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EmployeeQuery {
        pub employee_id: Option<i32>,
    }
}
