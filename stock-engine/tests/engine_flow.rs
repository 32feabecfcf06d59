//! End-to-end reconciliation flows against in-memory stores

use rust_decimal::Decimal;
use serde_json::json;
use shared::{Order, OrderLineItem, OrderStatus, ProductRecord};
use std::collections::HashMap;
use std::sync::Arc;
use stock_engine::{EngineConfig, OfflineOrderQueue, ReconcileError, StockReconciler};
use store_client::memory::{MemoryOrderStore, MemoryProductStore, MemoryUserDirectory};

struct World {
    products: Arc<MemoryProductStore>,
    orders: Arc<MemoryOrderStore>,
    users: Arc<MemoryUserDirectory>,
    queue: OfflineOrderQueue,
}

impl World {
    fn new() -> Self {
        Self {
            products: Arc::new(MemoryProductStore::new()),
            orders: Arc::new(MemoryOrderStore::new()),
            users: Arc::new(MemoryUserDirectory::with_emails(&["a@b.com", "c@d.com"])),
            queue: OfflineOrderQueue::open_in_memory().unwrap(),
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            retry_base_delay_ms: 1,
            ..EngineConfig::default()
        }
    }

    /// Reconciler with the remote order store configured.
    fn online(&self) -> StockReconciler {
        StockReconciler::new(
            self.products.clone(),
            self.users.clone(),
            Some(self.orders.clone()),
            self.queue.clone(),
            &Self::config(),
        )
    }

    /// Reconciler without a remote order store (offline mode).
    fn offline(&self) -> StockReconciler {
        StockReconciler::new(
            self.products.clone(),
            self.users.clone(),
            None,
            self.queue.clone(),
            &Self::config(),
        )
    }

    fn seed_product(&self, id: &str, quantity: i64) {
        self.products
            .insert(ProductRecord::new(json!({"id": id, "quantity": quantity})));
    }
}

fn item(id: &str, price: i64, qty: u32) -> OrderLineItem {
    OrderLineItem {
        product_id: id.to_string(),
        name: format!("Item {id}"),
        unit_price: Decimal::from(price),
        quantity: qty,
    }
}

#[tokio::test]
async fn test_create_order_consumes_stock_and_persists() {
    let world = World::new();
    world.seed_product("p1", 5);

    let order = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();

    assert_eq!(world.products.quantity("p1"), 3);
    assert_eq!(order.subtotal, Decimal::from(20));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.id.is_some());
    assert!(!order.is_local);
    assert_eq!(world.orders.orders().len(), 1);
    assert!(world.queue.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_order_insufficient_stock_has_no_side_effects() {
    let world = World::new();
    world.seed_product("p1", 1);

    let err = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::InsufficientStock(ref id) if id == "p1"));
    assert_eq!(world.products.quantity("p1"), 1);
    assert_eq!(world.products.replace_count(), 0);
    assert!(world.orders.orders().is_empty());
}

#[tokio::test]
async fn test_create_order_validation_short_circuits() {
    let world = World::new();
    world.seed_product("p1", 5);

    let err = world
        .online()
        .create_order("nobody@nowhere.com", vec![item("p1", 10, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Validation(_)));

    let err = world
        .online()
        .create_order("a@b.com", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Validation(_)));

    // validation failures never reach the product store
    assert_eq!(world.products.fetch_count(), 0);
    assert_eq!(world.products.replace_count(), 0);
}

#[tokio::test]
async fn test_create_order_requests_for_same_product_are_summed() {
    let world = World::new();
    world.seed_product("p1", 3);

    // two lines of the same product: 2 + 2 > 3 available
    let err = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2), item("p1", 10, 2)])
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InsufficientStock(_)));
    assert_eq!(world.products.quantity("p1"), 3);
}

#[tokio::test]
async fn test_create_order_partial_failure_rolls_back_applied_updates() {
    let world = World::new();
    world.seed_product("p1", 5);
    world.seed_product("p2", 8);
    // p2 fails through the whole retry budget
    world.products.fail_next_replacements("p2", 3);

    let err = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2), item("p2", 4, 1)])
        .await
        .unwrap_err();

    match err {
        ReconcileError::PartialFailure {
            total,
            failed,
            compensated,
        } => {
            assert_eq!(total, 2);
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].product_id(), "p2");
            assert!(compensated, "p1's applied update must be restored");
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // p1 was decremented then compensated back; p2 never moved
    assert_eq!(world.products.quantity("p1"), 5);
    assert_eq!(world.products.quantity("p2"), 8);
    assert!(world.orders.orders().is_empty());
}

#[tokio::test]
async fn test_create_order_reports_failed_compensation() {
    let world = World::new();
    world.seed_product("p1", 5);
    world.seed_product("p2", 8);
    // p2 fails through the whole retry budget; p1's first write
    // lands, but the rollback write (its second) fails too
    world.products.fail_next_replacements("p2", 3);
    world.products.fail_nth_replacement("p1", 2);

    let err = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2), item("p2", 4, 1)])
        .await
        .unwrap_err();

    match err {
        ReconcileError::PartialFailure {
            total,
            failed,
            compensated,
        } => {
            assert_eq!(total, 2);
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].product_id(), "p2");
            assert!(!compensated, "failed restore must be reported");
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // the restore is single-attempt and not retried: p1 stays
    // decremented, p2 never moved, the order was not persisted
    assert_eq!(world.products.quantity("p1"), 3);
    assert_eq!(world.products.quantity("p2"), 8);
    assert!(world.orders.orders().is_empty());
}

#[tokio::test]
async fn test_create_order_offline_queues_locally() {
    let world = World::new();
    world.seed_product("p1", 5);

    let order = world
        .offline()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();

    // stock adjusted exactly once, at creation time
    assert_eq!(world.products.quantity("p1"), 3);
    assert!(order.is_local);
    assert!(order.id.as_deref().unwrap().starts_with("local-"));

    let queued = world.queue.list().unwrap();
    assert_eq!(queued.len(), 1);
    assert!(!queued[0].sync_error);
    assert!(world.orders.orders().is_empty());
}

#[tokio::test]
async fn test_edit_order_applies_deltas_and_persists() {
    let world = World::new();
    // p1 already reflects the original 2-unit consumption
    world.seed_product("p1", 3);
    world.seed_product("p2", 10);

    let previous = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();
    // the create consumed 2 more; put the fixture back to its
    // starting point
    world.seed_product("p1", 3);

    let mut next = previous.clone();
    next.set_items(vec![item("p1", 10, 1), item("p2", 4, 3)]);

    let edited = world.online().edit_order(&previous, next).await.unwrap();

    // p1 delta +1 -> 4, p2 delta -3 -> 7
    assert_eq!(world.products.quantity("p1"), 4);
    assert_eq!(world.products.quantity("p2"), 7);
    assert_eq!(edited.subtotal, Decimal::from(22));

    let stored = world.orders.orders();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].items.len(), 2);
    assert_eq!(stored[0].subtotal, Decimal::from(22));
}

#[tokio::test]
async fn test_edit_order_partial_failure_keeps_applied_writes() {
    let world = World::new();
    world.seed_product("p1", 3);
    world.seed_product("p2", 10);

    let previous = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();
    world.seed_product("p1", 3);

    // p2's consumption will fail through the retry budget
    world.products.fail_next_replacements("p2", 3);

    let mut next = previous.clone();
    next.set_items(vec![item("p1", 10, 1), item("p2", 4, 3)]);

    let err = world
        .online()
        .edit_order(&previous, next)
        .await
        .unwrap_err();

    match err {
        ReconcileError::PartialFailure { compensated, .. } => {
            assert!(!compensated, "edit path does not compensate");
        }
        other => panic!("expected PartialFailure, got {other:?}"),
    }

    // p1's applied return stays applied (inherited asymmetry with
    // the create path), the order itself keeps its old item set
    assert_eq!(world.products.quantity("p1"), 4);
    assert_eq!(world.products.quantity("p2"), 10);
    let stored = world.orders.orders();
    assert_eq!(stored[0].items.len(), 1);
    assert_eq!(stored[0].subtotal, Decimal::from(20));
}

#[tokio::test]
async fn test_restore_and_delete_returns_stock_then_removes_order() {
    let world = World::new();
    world.seed_product("p1", 5);

    let order = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();
    assert_eq!(world.products.quantity("p1"), 3);

    let returns = HashMap::from([(0usize, 2u32)]);
    world
        .online()
        .restore_and_delete(&order, &returns)
        .await
        .unwrap();

    assert_eq!(world.products.quantity("p1"), 5);
    assert!(world.orders.orders().is_empty());
}

#[tokio::test]
async fn test_restore_and_delete_failure_retains_order() {
    let world = World::new();
    world.seed_product("p1", 5);

    let order = world
        .online()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();

    world.products.fail_next_replacements("p1", 3);
    let returns = HashMap::from([(0usize, 2u32)]);
    let err = world
        .online()
        .restore_and_delete(&order, &returns)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::PartialFailure { .. }));
    assert_eq!(world.orders.orders().len(), 1, "order must be retained");
}

#[tokio::test]
async fn test_restore_and_delete_rejects_order_without_id() {
    let world = World::new();
    world.seed_product("p1", 5);

    let order = Order::draft("a@b.com", vec![item("p1", 10, 2)]);
    assert!(order.id.is_none());

    let returns = HashMap::from([(0usize, 2u32)]);
    let err = world
        .online()
        .restore_and_delete(&order, &returns)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Validation(_)));
    // rejected before any stock moved
    assert_eq!(world.products.quantity("p1"), 5);
    assert_eq!(world.products.replace_count(), 0);
}

#[tokio::test]
async fn test_replay_moves_queued_orders_without_touching_stock() {
    let world = World::new();
    world.seed_product("p1", 5);

    // two orders accepted offline; stock adjusted at creation
    world
        .offline()
        .create_order("a@b.com", vec![item("p1", 10, 1)])
        .await
        .unwrap();
    world
        .offline()
        .create_order("c@d.com", vec![item("p1", 10, 1)])
        .await
        .unwrap();
    assert_eq!(world.products.quantity("p1"), 3);
    let writes_before = world.products.replace_count();

    // order store reachable again
    let report = world.online().sync_offline_orders().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.queued, 0);
    assert_eq!(report.flagged, 0);
    assert!(world.queue.list().unwrap().is_empty());
    assert_eq!(world.orders.orders().len(), 2);

    // replay adjusts stock at most once relative to creation time:
    // creation already did it, so replay does not write at all
    assert_eq!(world.products.quantity("p1"), 3);
    assert_eq!(world.products.replace_count(), writes_before);
}

#[tokio::test]
async fn test_replay_without_order_store_is_rejected() {
    let world = World::new();
    let err = world.offline().sync_offline_orders().await.unwrap_err();
    assert!(matches!(err, ReconcileError::Store(_)));
}

#[tokio::test]
async fn test_restore_and_delete_local_order_leaves_queue_consistent() {
    let world = World::new();
    world.seed_product("p1", 5);

    let order = world
        .offline()
        .create_order("a@b.com", vec![item("p1", 10, 2)])
        .await
        .unwrap();
    assert_eq!(world.products.quantity("p1"), 3);

    let returns = HashMap::from([(0usize, 2u32)]);
    world
        .offline()
        .restore_and_delete(&order, &returns)
        .await
        .unwrap();

    assert_eq!(world.products.quantity("p1"), 5);
    assert!(world.queue.list().unwrap().is_empty());
}
