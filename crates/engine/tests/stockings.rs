mod common;

use engine::{
    CreateStockingCmd, EngineError, ErrorKind, PriceCents, UpdateStockingCmd,
};

use common::fixture;

#[tokio::test]
async fn same_name_in_another_warehouse_reuses_item() {
    let fx = fixture().await;

    let first = fx.stock("Bolt", "Hardware", fx.north, 25, 100).await;
    assert!(first.is_new_item);
    assert_eq!(first.category, "Hardware");

    // Different case, surrounding whitespace and a different category.
    let second = fx.stock("bolt ", "Tools", fx.south, 30, 10).await;
    assert!(!second.is_new_item);
    assert_eq!(second.item_id, first.item_id);
    assert_eq!(second.category, "Hardware");

    let item = fx.engine.item(first.item_id).await.unwrap();
    assert_eq!(item.name, "Bolt");
    assert_eq!(item.category, "Hardware");
}

#[tokio::test]
async fn same_name_in_same_warehouse_is_a_conflict() {
    let fx = fixture().await;
    let first = fx.stock("Bolt", "Hardware", fx.north, 25, 100).await;

    let err = fx
        .engine
        .create_stocking(CreateStockingCmd::new("  BOLT", "Hardware", fx.north, fx.supplier))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::DuplicateInWarehouse {
            item_id: first.item_id,
            warehouse_id: fx.north
        }
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(fx.quantity(first.item_id, fx.north).await, 100);
}

#[tokio::test]
async fn new_names_get_distinct_ids() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 1).await;
    let nut = fx.stock("Nut", "Hardware", fx.north, 10, 1).await;
    assert!(nut.is_new_item);
    assert_ne!(bolt.item_id, nut.item_id);
}

#[tokio::test]
async fn stocking_validates_input_and_references() {
    let fx = fixture().await;

    let blank = fx
        .engine
        .create_stocking(CreateStockingCmd::new("   ", "Hardware", fx.north, fx.supplier))
        .await
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::Validation);

    let negative = fx
        .engine
        .create_stocking(
            CreateStockingCmd::new("Bolt", "Hardware", fx.north, fx.supplier).quantity(-1),
        )
        .await
        .unwrap_err();
    assert_eq!(negative.kind(), ErrorKind::Validation);

    let missing_warehouse = fx
        .engine
        .create_stocking(CreateStockingCmd::new("Bolt", "Hardware", 999, fx.supplier))
        .await
        .unwrap_err();
    assert_eq!(missing_warehouse.kind(), ErrorKind::NotFound);

    let missing_supplier = fx
        .engine
        .create_stocking(CreateStockingCmd::new("Bolt", "Hardware", fx.north, 999))
        .await
        .unwrap_err();
    assert_eq!(missing_supplier.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn update_changes_price_but_never_quantity() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 40).await;

    let row = fx
        .engine
        .update_stocking(
            UpdateStockingCmd::new(bolt.item_id, fx.north).price(PriceCents::try_new(99).unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(row.price.cents(), 99);
    assert_eq!(row.stock_quantity, 40);

    let empty = fx
        .engine
        .update_stocking(UpdateStockingCmd::new(bolt.item_id, fx.north))
        .await
        .unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn remove_is_refused_once_the_row_has_moved() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 40).await;
    let nut = fx.stock("Nut", "Hardware", fx.north, 10, 5).await;

    fx.engine
        .record_movement(fx.stock_out(bolt.item_id, fx.north, 1))
        .await
        .unwrap();

    let err = fx
        .engine
        .remove_stocking(bolt.item_id, fx.north)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StockingInUse(_)));

    fx.engine.remove_stocking(nut.item_id, fx.north).await.unwrap();
    let gone = fx.engine.stock_row(nut.item_id, fx.north).await.unwrap_err();
    assert_eq!(gone.kind(), ErrorKind::NotFound);

    // The item survives and keeps its id when stocked again.
    let again = fx.stock("nut", "Hardware", fx.south, 10, 5).await;
    assert_eq!(again.item_id, nut.item_id);
    assert!(!again.is_new_item);
}
