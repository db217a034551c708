//! Stock ledger schema.
//!
//! - `items`: logical product identity, unique by normalized name
//! - `stock_rows`: one row per (item, warehouse) stocking
//! - `ledger_entries`: IN/OUT movements applied to a stock row

use sea_orm_migration::prelude::*;

use crate::m20261019_000001_reference_data::{Customers, Employees, Suppliers, Warehouses};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Items {
    Table,
    Id,
    Name,
    NameNorm,
    Category,
}

#[derive(Iden)]
enum StockRows {
    Table,
    ItemId,
    WarehouseId,
    PriceCents,
    StockQuantity,
    OpeningQuantity,
    SupplierId,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    Kind,
    ItemId,
    WarehouseId,
    Quantity,
    EmployeeId,
    CustomerId,
    SupplierId,
    PeerWarehouseId,
    TransferId,
    OccurredAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Items are never deleted, so AUTOINCREMENT ids are never reused.
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::NameNorm).string().not_null())
                    .col(ColumnDef::new(Items::Category).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-items-name_norm")
                    .table(Items::Table)
                    .col(Items::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockRows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StockRows::ItemId).integer().not_null())
                    .col(ColumnDef::new(StockRows::WarehouseId).integer().not_null())
                    .col(
                        ColumnDef::new(StockRows::PriceCents)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(StockRows::PriceCents).gte(0)),
                    )
                    .col(
                        ColumnDef::new(StockRows::StockQuantity)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(StockRows::StockQuantity).gte(0)),
                    )
                    .col(
                        ColumnDef::new(StockRows::OpeningQuantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(StockRows::SupplierId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk-stock_rows")
                            .col(StockRows::ItemId)
                            .col(StockRows::WarehouseId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_rows-item_id")
                            .from(StockRows::Table, StockRows::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_rows-warehouse_id")
                            .from(StockRows::Table, StockRows::WarehouseId)
                            .to(Warehouses::Table, Warehouses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_rows-supplier_id")
                            .from(StockRows::Table, StockRows::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::Kind).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::ItemId).integer().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::WarehouseId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Quantity)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LedgerEntries::Quantity).gt(0)),
                    )
                    .col(ColumnDef::new(LedgerEntries::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(LedgerEntries::CustomerId).integer())
                    .col(ColumnDef::new(LedgerEntries::SupplierId).integer())
                    .col(ColumnDef::new(LedgerEntries::PeerWarehouseId).integer())
                    .col(ColumnDef::new(LedgerEntries::TransferId).string())
                    .col(
                        ColumnDef::new(LedgerEntries::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-stock_row")
                            .from_tbl(LedgerEntries::Table)
                            .from_col(LedgerEntries::ItemId)
                            .from_col(LedgerEntries::WarehouseId)
                            .to_tbl(StockRows::Table)
                            .to_col(StockRows::ItemId)
                            .to_col(StockRows::WarehouseId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-employee_id")
                            .from(LedgerEntries::Table, LedgerEntries::EmployeeId)
                            .to(Employees::Table, Employees::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-customer_id")
                            .from(LedgerEntries::Table, LedgerEntries::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-supplier_id")
                            .from(LedgerEntries::Table, LedgerEntries::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-peer_warehouse_id")
                            .from(LedgerEntries::Table, LedgerEntries::PeerWarehouseId)
                            .to(Warehouses::Table, Warehouses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-stock_row-occurred_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::ItemId)
                    .col(LedgerEntries::WarehouseId)
                    .col(LedgerEntries::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-transfer_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::TransferId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-employee_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::EmployeeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockRows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        Ok(())
    }
}
