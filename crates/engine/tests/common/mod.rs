#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use engine::{CreateStockingCmd, Engine, PriceCents, RecordMovementCmd, StockingCreated};
use migration::MigratorTrait;

pub struct Fixture {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub north: i32,
    pub south: i32,
    pub supplier: i32,
    pub employee: i32,
    pub customer: i32,
}

/// In-memory database with one connection, so every transaction sees the
/// same database and concurrent transactions are serialized.
pub async fn fixture() -> Fixture {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    seeded(db).await
}

/// Database file removed again when dropped.
pub struct DbFile(PathBuf);

impl Drop for DbFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// SQLite file shared by a pool of several connections, so transactions
/// really run side by side and compete for the database lock.
pub async fn file_fixture() -> (Fixture, DbFile) {
    let path = std::env::temp_dir().join(format!("depot-test-{}.db", Uuid::new_v4()));
    let file = DbFile(path.clone());
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
    options.max_connections(4).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    (seeded(db).await, file)
}

async fn seeded(db: DatabaseConnection) -> Fixture {
    migration::Migrator::up(&db, None).await.unwrap();

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    let north = engine.new_warehouse("North dock", 1_000).await.unwrap().id;
    let south = engine.new_warehouse("South dock", 500).await.unwrap().id;
    let supplier = engine
        .new_supplier("Acme Fasteners", "555-0100", "sales@acme.test", "1 Bolt Way")
        .await
        .unwrap()
        .id;
    let employee = engine
        .new_employee("Dana Reyes", "dana@depot.test", None)
        .await
        .unwrap()
        .id;
    let customer = engine
        .new_customer("Sam Ortiz", "sam@example.test", Some("555-0199"))
        .await
        .unwrap()
        .id;

    Fixture {
        engine: Arc::new(engine),
        db,
        north,
        south,
        supplier,
        employee,
        customer,
    }
}

impl Fixture {
    pub async fn stock(
        &self,
        name: &str,
        category: &str,
        warehouse_id: i32,
        price_cents: i64,
        quantity: i64,
    ) -> StockingCreated {
        self.engine
            .create_stocking(
                CreateStockingCmd::new(name, category, warehouse_id, self.supplier)
                    .price(PriceCents::try_new(price_cents).unwrap())
                    .quantity(quantity),
            )
            .await
            .unwrap()
    }

    pub fn stock_in(&self, item_id: i32, warehouse_id: i32, quantity: i64) -> RecordMovementCmd {
        RecordMovementCmd::stock_in(item_id, warehouse_id, quantity, self.employee, self.supplier)
    }

    pub fn stock_out(&self, item_id: i32, warehouse_id: i32, quantity: i64) -> RecordMovementCmd {
        RecordMovementCmd::stock_out(item_id, warehouse_id, quantity, self.employee, self.customer)
    }

    pub async fn quantity(&self, item_id: i32, warehouse_id: i32) -> i64 {
        self.engine
            .stock_row(item_id, warehouse_id)
            .await
            .unwrap()
            .stock_quantity
    }
}
