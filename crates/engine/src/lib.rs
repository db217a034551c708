//! Warehouse stock ledger and transaction engine.
//!
//! The engine owns the rules that keep stock consistent: item identity
//! resolution, `IN`/`OUT` movements and their reversal, warehouse transfers
//! and bulk price changes. Every write runs in one database transaction.

pub use actor::{ADMIN_ID, Actor, ActorRole};
pub use commands::{
    BulkAdjustPricesCmd, CreateStockingCmd, RecordMovementCmd, TransferStockCmd,
    UpdateStockingCmd,
};
pub use customers::Customer;
pub use employees::Employee;
pub use error::{EngineError, ErrorKind};
pub use items::Item;
pub use ledger_entries::{Counterparty, LedgerEntry, MovementKind};
pub use ops::{
    EmployeeActivity, Engine, EngineBuilder, InventoryLine, LedgerFilter, LedgerPage,
    LowStockLine, MovementRecorded, MovementReversed, PricesAdjusted, QuantityChange,
    StockReplay, StockTransferred, StockingCreated, SupplierPerformance, WarehouseValue,
};
pub use price::{PercentChange, PriceCents};
pub use stock_rows::StockRow;
pub use suppliers::Supplier;
pub use warehouses::Warehouse;

mod actor;
mod commands;
mod customers;
mod employees;
mod error;
mod items;
mod ledger_entries;
mod ops;
mod price;
mod stock_rows;
mod suppliers;
mod util;
mod warehouses;

type ResultEngine<T> = Result<T, EngineError>;
