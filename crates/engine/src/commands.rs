//! Command structs for engine operations.
//!
//! These types group parameters for write operations (stocking, movements,
//! transfers, price changes), keeping call sites readable and avoiding long
//! argument lists.

use crate::{MovementKind, PercentChange, PriceCents};

/// Register an item in a warehouse, reusing the item identity when the name
/// is already known.
#[derive(Clone, Debug)]
pub struct CreateStockingCmd {
    pub name: String,
    pub category: String,
    pub warehouse_id: i32,
    pub price: PriceCents,
    pub quantity: i64,
    pub supplier_id: i32,
}

impl CreateStockingCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        warehouse_id: i32,
        supplier_id: i32,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            warehouse_id,
            price: PriceCents::ZERO,
            quantity: 0,
            supplier_id,
        }
    }

    #[must_use]
    pub fn price(mut self, price: PriceCents) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Record one `IN` or `OUT` movement against a stock row.
///
/// `IN` movements name the supplier, `OUT` movements name the customer.
#[derive(Clone, Debug)]
pub struct RecordMovementCmd {
    pub kind: MovementKind,
    pub item_id: i32,
    pub warehouse_id: i32,
    pub quantity: i64,
    pub employee_id: i32,
    pub customer_id: Option<i32>,
    pub supplier_id: Option<i32>,
}

impl RecordMovementCmd {
    #[must_use]
    pub fn new(
        kind: MovementKind,
        item_id: i32,
        warehouse_id: i32,
        quantity: i64,
        employee_id: i32,
    ) -> Self {
        Self {
            kind,
            item_id,
            warehouse_id,
            quantity,
            employee_id,
            customer_id: None,
            supplier_id: None,
        }
    }

    /// Restock from a supplier.
    #[must_use]
    pub fn stock_in(
        item_id: i32,
        warehouse_id: i32,
        quantity: i64,
        employee_id: i32,
        supplier_id: i32,
    ) -> Self {
        Self::new(MovementKind::In, item_id, warehouse_id, quantity, employee_id)
            .supplier_id(supplier_id)
    }

    /// Sell to a customer.
    #[must_use]
    pub fn stock_out(
        item_id: i32,
        warehouse_id: i32,
        quantity: i64,
        employee_id: i32,
        customer_id: i32,
    ) -> Self {
        Self::new(MovementKind::Out, item_id, warehouse_id, quantity, employee_id)
            .customer_id(customer_id)
    }

    #[must_use]
    pub fn customer_id(mut self, customer_id: i32) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    #[must_use]
    pub fn supplier_id(mut self, supplier_id: i32) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }
}

/// Move stock of one item between two warehouses.
#[derive(Clone, Debug)]
pub struct TransferStockCmd {
    pub item_id: i32,
    pub from_warehouse_id: i32,
    pub to_warehouse_id: i32,
    pub quantity: i64,
    pub employee_id: i32,
    /// Supplier recorded on the destination row when it has to be created.
    pub supplier_id: i32,
}

impl TransferStockCmd {
    #[must_use]
    pub fn new(
        item_id: i32,
        from_warehouse_id: i32,
        to_warehouse_id: i32,
        quantity: i64,
        employee_id: i32,
        supplier_id: i32,
    ) -> Self {
        Self {
            item_id,
            from_warehouse_id,
            to_warehouse_id,
            quantity,
            employee_id,
            supplier_id,
        }
    }
}

/// Scale the price of every stock row whose item is in `category`.
#[derive(Clone, Debug)]
pub struct BulkAdjustPricesCmd {
    pub category: String,
    pub change: PercentChange,
}

impl BulkAdjustPricesCmd {
    #[must_use]
    pub fn new(category: impl Into<String>, change: PercentChange) -> Self {
        Self {
            category: category.into(),
            change,
        }
    }
}

/// Edit the non-quantity attributes of a stock row.
///
/// Quantity only changes through movements.
#[derive(Clone, Debug, Default)]
pub struct UpdateStockingCmd {
    pub item_id: i32,
    pub warehouse_id: i32,
    pub price: Option<PriceCents>,
    pub supplier_id: Option<i32>,
}

impl UpdateStockingCmd {
    #[must_use]
    pub fn new(item_id: i32, warehouse_id: i32) -> Self {
        Self {
            item_id,
            warehouse_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn price(mut self, price: PriceCents) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn supplier_id(mut self, supplier_id: i32) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }
}
