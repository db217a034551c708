mod common;

use chrono::Utc;
use engine::{EngineError, ErrorKind, LedgerFilter, MovementKind, RecordMovementCmd};

use common::fixture;

#[tokio::test]
async fn in_and_out_update_quantity_atomically() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 10).await;

    let restock = fx
        .engine
        .record_movement(fx.stock_in(bolt.item_id, fx.north, 15))
        .await
        .unwrap();
    assert_eq!(restock.previous_qty, 10);
    assert_eq!(restock.new_qty, 25);

    let sale = fx
        .engine
        .record_movement(fx.stock_out(bolt.item_id, fx.north, 5))
        .await
        .unwrap();
    assert_eq!(sale.previous_qty, 25);
    assert_eq!(sale.new_qty, 20);
    assert_ne!(sale.transaction_id, restock.transaction_id);

    let entry = fx.engine.ledger_entry(sale.transaction_id).await.unwrap();
    assert_eq!(entry.kind, MovementKind::Out);
    assert_eq!(entry.quantity, 5);
    assert_eq!(fx.quantity(bolt.item_id, fx.north).await, 20);
}

#[tokio::test]
async fn insufficient_stock_reports_available_and_changes_nothing() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 30).await;

    let err = fx
        .engine
        .record_movement(fx.stock_out(bolt.item_id, fx.north, 50))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::InsufficientStock {
            available: 30,
            requested: 50
        }
    );
    assert_eq!(fx.quantity(bolt.item_id, fx.north).await, 30);
    let page = fx
        .engine
        .ledger_entries(&LedgerFilter::default(), 10, None)
        .await
        .unwrap();
    assert!(page.entries.is_empty());
}

#[tokio::test]
async fn reversal_restores_previous_quantity() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 30).await;

    let sale = fx
        .engine
        .record_movement(fx.stock_out(bolt.item_id, fx.north, 12))
        .await
        .unwrap();
    let reversed = fx
        .engine
        .reverse_movement(sale.transaction_id)
        .await
        .unwrap();

    assert_eq!(reversed.previous_qty, 18);
    assert_eq!(reversed.new_qty, 30);
    assert_eq!(reversed.reversed_entry_ids, vec![sale.transaction_id]);
    let gone = fx
        .engine
        .ledger_entry(sale.transaction_id)
        .await
        .unwrap_err();
    assert_eq!(gone.kind(), ErrorKind::NotFound);

    let twice = fx
        .engine
        .reverse_movement(sale.transaction_id)
        .await
        .unwrap_err();
    assert_eq!(twice.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn reversing_consumed_restock_would_go_negative() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 0).await;

    let restock = fx
        .engine
        .record_movement(fx.stock_in(bolt.item_id, fx.north, 20))
        .await
        .unwrap();
    fx.engine
        .record_movement(fx.stock_out(bolt.item_id, fx.north, 15))
        .await
        .unwrap();

    let err = fx
        .engine
        .reverse_movement(restock.transaction_id)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::WouldGoNegative {
            current: 5,
            restored: -15
        }
    );
    assert_eq!(fx.quantity(bolt.item_id, fx.north).await, 5);
    assert!(fx.engine.ledger_entry(restock.transaction_id).await.is_ok());
}

#[tokio::test]
async fn movements_validate_input() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 10).await;

    let zero = fx
        .engine
        .record_movement(fx.stock_in(bolt.item_id, fx.north, 0))
        .await
        .unwrap_err();
    assert_eq!(zero.kind(), ErrorKind::Validation);

    let no_customer = fx
        .engine
        .record_movement(RecordMovementCmd::new(
            MovementKind::Out,
            bolt.item_id,
            fx.north,
            1,
            fx.employee,
        ))
        .await
        .unwrap_err();
    assert_eq!(no_customer.kind(), ErrorKind::Validation);

    let bad_type = MovementKind::try_from("SWAP").unwrap_err();
    assert_eq!(bad_type.kind(), ErrorKind::Validation);

    let unstocked = fx
        .engine
        .record_movement(fx.stock_in(bolt.item_id, fx.south, 1))
        .await
        .unwrap_err();
    assert_eq!(unstocked.kind(), ErrorKind::NotFound);

    let unknown_employee = fx
        .engine
        .record_movement(RecordMovementCmd::stock_in(
            bolt.item_id,
            fx.north,
            1,
            999,
            fx.supplier,
        ))
        .await
        .unwrap_err();
    assert_eq!(unknown_employee.kind(), ErrorKind::NotFound);
    assert_eq!(fx.quantity(bolt.item_id, fx.north).await, 10);
}

#[tokio::test]
async fn ledger_replays_to_recorded_quantity() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 10).await;

    for cmd in [
        fx.stock_in(bolt.item_id, fx.north, 7),
        fx.stock_out(bolt.item_id, fx.north, 12),
        fx.stock_in(bolt.item_id, fx.north, 3),
    ] {
        fx.engine.record_movement(cmd).await.unwrap();
    }

    let replay = fx.engine.replay_stock(bolt.item_id, fx.north).await.unwrap();
    assert_eq!(replay.opening_quantity, 10);
    assert_eq!(replay.entries, 3);
    assert_eq!(replay.replayed_quantity, 8);
    assert_eq!(replay.recorded_quantity, 8);
    assert_eq!(replay.lowest_quantity, 5);
    assert!(replay.consistent);
}

#[tokio::test]
async fn entries_are_stamped_when_written() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 0).await;

    let before = Utc::now();
    fx.engine
        .record_movement(fx.stock_in(bolt.item_id, fx.north, 20))
        .await
        .unwrap();
    fx.engine
        .record_movement(fx.stock_out(bolt.item_id, fx.north, 15))
        .await
        .unwrap();
    let after = Utc::now();

    let mut entries = fx
        .engine
        .ledger_entries(&LedgerFilter::default(), 10, None)
        .await
        .unwrap()
        .entries;
    entries.reverse();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].occurred_at <= entries[1].occurred_at);
    assert!(entries.iter().all(|e| e.occurred_at >= before && e.occurred_at <= after));

    // Replay walks entries in time order; the sale must not land before the
    // restock it depends on.
    let replay = fx.engine.replay_stock(bolt.item_id, fx.north).await.unwrap();
    assert_eq!(replay.lowest_quantity, 0);
    assert_eq!(replay.replayed_quantity, 5);
    assert!(replay.consistent);
}

#[tokio::test]
async fn ledger_listing_pages_newest_first() {
    let fx = fixture().await;
    let bolt = fx.stock("Bolt", "Hardware", fx.north, 25, 0).await;

    let mut ids = Vec::new();
    for quantity in 1..=5 {
        let recorded = fx
            .engine
            .record_movement(fx.stock_in(bolt.item_id, fx.north, quantity))
            .await
            .unwrap();
        ids.push(recorded.transaction_id);
    }

    let filter = LedgerFilter {
        item_id: Some(bolt.item_id),
        ..LedgerFilter::default()
    };
    let first = fx.engine.ledger_entries(&filter, 2, None).await.unwrap();
    assert_eq!(
        first.entries.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![ids[4], ids[3]]
    );
    let cursor = first.next_cursor.unwrap();

    let second = fx
        .engine
        .ledger_entries(&filter, 10, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(
        second.entries.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1], ids[0]]
    );
    assert!(second.next_cursor.is_none());

    let outs = fx
        .engine
        .ledger_entries(
            &LedgerFilter {
                kind: Some(MovementKind::Out),
                ..LedgerFilter::default()
            },
            10,
            None,
        )
        .await
        .unwrap();
    assert!(outs.entries.is_empty());
}
