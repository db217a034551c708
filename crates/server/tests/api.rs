use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;

struct TestApp {
    router: Router,
    north: i32,
    south: i32,
    supplier: i32,
    employee: i32,
    customer: i32,
}

async fn test_app() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let engine = Engine::builder().database(db).build().await.unwrap();
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
        .new_customer("Sam Ortiz", "sam@example.test", None)
        .await
        .unwrap()
        .id;

    TestApp {
        router: server::app(engine),
        north,
        south,
        supplier,
        employee,
        customer,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        actor: Option<(&str, i32)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((role, id)) = actor {
            builder = builder
                .header("x-actor-role", role)
                .header("x-actor-id", id.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn as_employee(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(("employee", self.employee)), body)
            .await
    }

    async fn create_bolts(&self, warehouse_id: i32, quantity: i64) -> i32 {
        let (status, body) = self
            .as_employee(
                "POST",
                "/stockings",
                Some(json!({
                    "name": "Hex bolt M8",
                    "category": "Fasteners",
                    "warehouse_id": warehouse_id,
                    "price_minor": 250,
                    "quantity": quantity,
                    "supplier_id": self.supplier,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["item_id"].as_i64().unwrap() as i32
    }
}

#[tokio::test]
async fn missing_actor_headers_are_unauthorized() {
    let app = test_app().await;
    let (status, body) = app
        .send("GET", "/reports/inventory-value", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn unknown_actor_is_unauthorized() {
    let app = test_app().await;
    let (status, _) = app
        .send("GET", "/reports/inventory-value", Some(("employee", 999)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_can_read_but_not_write() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .send(
            "GET",
            &format!("/stockings/{item_id}/{}", app.north),
            Some(("customer", app.customer)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock_quantity"], 10);

    let (status, body) = app
        .send(
            "POST",
            "/movements",
            Some(("customer", app.customer)),
            Some(json!({
                "type": "OUT",
                "item_id": item_id,
                "warehouse_id": app.north,
                "quantity": 1,
                "employee_id": app.employee,
                "customer_id": app.customer,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn admin_uses_id_zero() {
    let app = test_app().await;
    let (status, _) = app
        .send("GET", "/reports/top-supplier", Some(("admin", 0)), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send("GET", "/reports/top-supplier", Some(("admin", 1)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_stocking_is_conflict() {
    let app = test_app().await;
    app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/stockings",
            Some(json!({
                "name": "  hex BOLT m8 ",
                "category": "Hardware",
                "warehouse_id": app.north,
                "price_minor": 300,
                "quantity": 1,
                "supplier_id": app.supplier,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn same_name_elsewhere_reuses_item() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/stockings",
            Some(json!({
                "name": "HEX BOLT M8",
                "category": "Hardware",
                "warehouse_id": app.south,
                "price_minor": 300,
                "quantity": 4,
                "supplier_id": app.supplier,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item_id"], item_id);
    assert_eq!(body["is_new_item"], false);
    assert_eq!(body["category"], "Fasteners");

    let (status, body) = app
        .as_employee("GET", &format!("/items/{item_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_stock"], 14);
    assert_eq!(body["stockings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn oversell_reports_available_quantity() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 3).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/movements",
            Some(json!({
                "type": "out",
                "item_id": item_id,
                "warehouse_id": app.north,
                "quantity": 5,
                "employee_id": app.employee,
                "customer_id": app.customer,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["available"], 3);
}

#[tokio::test]
async fn movement_record_list_and_reverse() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/movements",
            Some(json!({
                "type": "IN",
                "item_id": item_id,
                "warehouse_id": app.north,
                "quantity": 5,
                "employee_id": app.employee,
                "supplier_id": app.supplier,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["previous_qty"], 10);
    assert_eq!(body["new_qty"], 15);
    let entry_id = body["transaction_id"].as_i64().unwrap();

    let (status, body) = app
        .as_employee("GET", &format!("/movements?item_id={item_id}&type=IN"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], entry_id);
    assert_eq!(entries[0]["supplier_id"], app.supplier);
    assert!(body["next_cursor"].is_null());

    let (status, body) = app
        .as_employee("DELETE", &format!("/movements/{entry_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_qty"], 10);

    let (status, _) = app
        .as_employee("DELETE", &format!("/movements/{entry_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_movement_type_is_validation_error() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/movements",
            Some(json!({
                "type": "SIDEWAYS",
                "item_id": item_id,
                "warehouse_id": app.north,
                "quantity": 1,
                "employee_id": app.employee,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn transfer_moves_stock_and_creates_destination() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/transfers",
            Some(json!({
                "item_id": item_id,
                "from_warehouse_id": app.north,
                "to_warehouse_id": app.south,
                "quantity": 4,
                "employee_id": app.employee,
                "supplier_id": app.supplier,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["ok"], true);
    assert_eq!(body["from_new_qty"], 6);
    assert_eq!(body["to_new_qty"], 4);

    let (status, body) = app
        .as_employee("GET", &format!("/stockings/{item_id}/{}", app.south), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_minor"], 250);
    assert_eq!(body["opening_quantity"], 0);

    let (status, body) = app
        .as_employee(
            "GET",
            &format!("/stockings/{item_id}/{}/replay", app.south),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consistent"], true);
    assert_eq!(body["replayed_quantity"], 4);
}

#[tokio::test]
async fn price_adjustment_and_reports() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, body) = app
        .as_employee(
            "POST",
            "/prices/adjust",
            Some(json!({ "category": "fasteners", "percent": "10" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows_affected"], 1);

    let (status, body) = app
        .as_employee(
            "POST",
            "/prices/adjust",
            Some(json!({ "category": "fasteners", "percent": "-150" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let (status, body) = app
        .as_employee(
            "POST",
            "/prices/adjust",
            Some(json!({ "category": "garden", "percent": "5" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");

    let (status, body) = app
        .as_employee("GET", &format!("/reports/warehouse-value/{}", app.north), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_value_minor"], 2750);

    let (status, body) = app
        .as_employee("GET", "/reports/low-stock/20", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["item_id"], item_id);

    let (status, body) = app
        .as_employee(
            "GET",
            &format!("/reports/inventory?warehouse_id={}", app.north),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["line_value_minor"], 2750);

    let (status, body) = app
        .as_employee(
            "GET",
            &format!("/reports/employees?employee_id={}", app.employee),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["in_count"], 0);
}

#[tokio::test]
async fn stocking_in_use_cannot_be_removed() {
    let app = test_app().await;
    let item_id = app.create_bolts(app.north, 10).await;

    let (status, _) = app
        .as_employee(
            "POST",
            "/movements",
            Some(json!({
                "type": "OUT",
                "item_id": item_id,
                "warehouse_id": app.north,
                "quantity": 2,
                "employee_id": app.employee,
                "customer_id": app.customer,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/stockings/{item_id}/{}", app.north);
    let (status, _) = app.as_employee("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .as_employee("PATCH", &uri, Some(json!({ "price_minor": 199 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_minor"], 199);
    assert_eq!(body["stock_quantity"], 8);
}
