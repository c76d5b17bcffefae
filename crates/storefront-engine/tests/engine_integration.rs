//! End-to-end tests for the order engine against an in-memory database:
//! placement, refund, status projection, and the oversell property under
//! concurrent placements.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::mpsc;

use storefront_core::{LineItem, OrderError, OrderRequest, OrderStatus, Product};
use storefront_db::{Database, DbConfig};
use storefront_engine::{
    spawn_notification_worker, EngineConfig, LogNotifier, Notifier, NotifyError, OrderConfirmation,
    OrderEngine, RefundPolicy, StaticUserDirectory,
};

// =============================================================================
// Fixtures
// =============================================================================

const USER: i64 = 1;

/// Builds an engine over a fresh in-memory database with the given
/// products and a directory containing only `USER`.
async fn engine_with(products: &[(&str, i64, i64)]) -> OrderEngine {
    engine_with_config(products, EngineConfig::default()).await
}

async fn engine_with_config(products: &[(&str, i64, i64)], config: EngineConfig) -> OrderEngine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let now = Utc::now();
    for (sku, stock, price_cents) in products {
        db.products()
            .insert(&Product {
                sku: sku.to_string(),
                stock: *stock,
                price_cents: *price_cents,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    let (notifications, _worker) = spawn_notification_worker(LogNotifier);
    OrderEngine::new(
        db,
        Arc::new(StaticUserDirectory::with_users([USER])),
        notifications,
        config,
    )
}

fn request(items: Vec<LineItem>) -> OrderRequest {
    OrderRequest::new(USER, items)
}

async fn stock_of(engine: &OrderEngine, sku: &str) -> i64 {
    engine
        .database()
        .products()
        .get_by_sku(sku)
        .await
        .unwrap()
        .unwrap()
        .stock
}

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
async fn placing_an_order_prices_persists_and_decrements() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();

    assert_eq!(placed.total_price_cents, 3000);
    assert_eq!(stock_of(&engine, "A1").await, 2);

    let order = engine
        .database()
        .orders()
        .get_by_id(placed.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.user_id, USER);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price_cents, 3000);

    let items = engine
        .database()
        .orders()
        .get_items(placed.order_id)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].sku, "A1");
    assert_eq!(items[0].quantity, 3);
}

#[tokio::test]
async fn multi_sku_total_sums_line_prices() {
    let engine = engine_with(&[("B2", 10, 250), ("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![
            LineItem::new("B2", 4), // 1000
            LineItem::new("A1", 2), // 2000
        ]))
        .await
        .unwrap();

    assert_eq!(placed.total_price_cents, 3000);
    assert_eq!(stock_of(&engine, "A1").await, 3);
    assert_eq!(stock_of(&engine, "B2").await, 6);
}

#[tokio::test]
async fn second_order_fails_once_stock_is_short() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();

    let err = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap_err();

    match err {
        OrderError::InsufficientStock {
            sku,
            available,
            requested,
        } => {
            assert_eq!(sku, "A1");
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // The failed order left nothing behind.
    assert_eq!(stock_of(&engine, "A1").await, 2);
}

#[tokio::test]
async fn duplicate_sku_lines_share_the_stock_guard() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    // Each line alone fits, together they don't. The conditional
    // decrement catches what the per-line pre-check cannot.
    let err = engine
        .place_order(&request(vec![
            LineItem::new("A1", 3),
            LineItem::new("A1", 3),
        ]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    // Full rollback: the first line's decrement was undone.
    assert_eq!(stock_of(&engine, "A1").await, 5);
}

#[tokio::test]
async fn unknown_user_leaves_no_order_row() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let err = engine
        .place_order(&OrderRequest::new(999, vec![LineItem::new("A1", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::UserNotFound(999)));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(engine.database().pool())
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(stock_of(&engine, "A1").await, 5);
}

#[tokio::test]
async fn unknown_product_rolls_back_the_whole_order() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let err = engine
        .place_order(&request(vec![
            LineItem::new("A1", 2),
            LineItem::new("GHOST", 1),
        ]))
        .await
        .unwrap_err();

    match err {
        OrderError::ProductNotFound(sku) => assert_eq!(sku, "GHOST"),
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
    assert_eq!(stock_of(&engine, "A1").await, 5);
}

#[tokio::test]
async fn malformed_requests_are_rejected_upfront() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    for bad in [
        request(vec![]),
        request(vec![LineItem::new("A1", 0)]),
        request(vec![LineItem::new("A1", -2)]),
        request(vec![LineItem::new("", 1)]),
        request(vec![LineItem::new("A1 ", 1)]),
    ] {
        let err = engine.place_order(&bad).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidArgument(_)), "{bad:?}");
    }
}

#[tokio::test]
async fn price_is_captured_at_placement_time() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();

    // The product gets more expensive afterwards.
    sqlx::query("UPDATE products SET price_cents = 9999 WHERE sku = 'A1'")
        .execute(engine.database().pool())
        .await
        .unwrap();

    let report = engine.order_status(placed.order_id).await.unwrap();
    assert_eq!(report.total_price_cents, 3000);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    // Stock 5, eight racing orders of 2 units each: exactly two can fit,
    // the remaining unit satisfies nobody.
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .place_order(&request(vec![LineItem::new("A1", 2)]))
                .await
        }));
    }

    let mut successes = 0;
    let mut stockouts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(OrderError::InsufficientStock { .. }) => stockouts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(stockouts, 6);
    assert_eq!(stock_of(&engine, "A1").await, 1);
}

/// Engine over a file-backed WAL database, so placements run on separate
/// pooled connections instead of serializing on the single in-memory one.
async fn file_backed_engine(
    products: &[(&str, i64, i64)],
    max_connections: u32,
) -> (OrderEngine, PathBuf) {
    let path = std::env::temp_dir().join(format!(
        "storefront-test-{}-{}.db",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default(),
    ));

    let db = Database::new(DbConfig::new(&path).max_connections(max_connections))
        .await
        .unwrap();

    let now = Utc::now();
    for (sku, stock, price_cents) in products {
        db.products()
            .insert(&Product {
                sku: sku.to_string(),
                stock: *stock,
                price_cents: *price_cents,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    let (notifications, _worker) = spawn_notification_worker(LogNotifier);
    let engine = OrderEngine::new(
        db,
        Arc::new(StaticUserDirectory::with_users([USER])),
        notifications,
        EngineConfig::default(),
    );

    (engine, path)
}

fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(file));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell_across_connections() {
    // Same oversell scenario, but with eight pooled connections racing
    // the decrement guard for real. Lock contention surfaces as
    // SQLITE_BUSY and is absorbed by the bounded retry loop; no caller
    // ever sees a conflict, and the guard still admits exactly two.
    let (engine, path) = file_backed_engine(&[("A1", 5, 1000)], 8).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .place_order(&request(vec![LineItem::new("A1", 2)]))
                .await
        }));
    }

    let mut successes = 0;
    let mut stockouts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(OrderError::InsufficientStock { .. }) => stockouts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(stockouts, 6);
    assert_eq!(stock_of(&engine, "A1").await, 1);

    engine.database().close().await;
    remove_db_files(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_multi_sku_orders_stay_consistent() {
    let engine = engine_with(&[("A1", 6, 1000), ("B2", 6, 500)]).await;

    // Orders touch both SKUs in opposite caller orders; the sorted-SKU
    // lock order makes that safe.
    let mut handles = Vec::new();
    for i in 0..6 {
        let engine = engine.clone();
        let items = if i % 2 == 0 {
            vec![LineItem::new("A1", 2), LineItem::new("B2", 2)]
        } else {
            vec![LineItem::new("B2", 2), LineItem::new("A1", 2)]
        };
        handles.push(tokio::spawn(
            async move { engine.place_order(&request(items)).await },
        ));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    // Three orders exhaust both SKUs.
    assert_eq!(successes, 3);
    assert_eq!(stock_of(&engine, "A1").await, 0);
    assert_eq!(stock_of(&engine, "B2").await, 0);
}

// =============================================================================
// Refund
// =============================================================================

#[tokio::test]
async fn refund_restores_stock_and_flips_status() {
    let engine = engine_with(&[("A1", 5, 1000), ("B2", 4, 500)]).await;

    let placed = engine
        .place_order(&request(vec![
            LineItem::new("A1", 3),
            LineItem::new("B2", 2),
        ]))
        .await
        .unwrap();
    assert_eq!(stock_of(&engine, "A1").await, 2);
    assert_eq!(stock_of(&engine, "B2").await, 2);

    let receipt = engine.refund_order(placed.order_id).await.unwrap();
    assert_eq!(receipt.order_id, placed.order_id);
    assert_eq!(receipt.restocked_lines, 2);

    // Exact inverse of the placement decrement.
    assert_eq!(stock_of(&engine, "A1").await, 5);
    assert_eq!(stock_of(&engine, "B2").await, 4);

    let order = engine
        .database()
        .orders()
        .get_by_id(placed.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Refunded);
}

#[tokio::test]
async fn second_refund_is_rejected_without_double_restock() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();

    engine.refund_order(placed.order_id).await.unwrap();

    let err = engine.refund_order(placed.order_id).await.unwrap_err();
    assert!(matches!(err, OrderError::RefundNotEligible { .. }));

    // Restocked exactly once.
    assert_eq!(stock_of(&engine, "A1").await, 5);
}

#[tokio::test]
async fn refund_of_unknown_order_fails() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let err = engine.refund_order(424242).await.unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(424242)));
}

#[tokio::test]
async fn completed_only_policy_rejects_pending_orders() {
    let engine = engine_with_config(
        &[("A1", 5, 1000)],
        EngineConfig::default().refund_policy(RefundPolicy::CompletedOnly),
    )
    .await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();

    // Pending: not eligible under this policy.
    let err = engine.refund_order(placed.order_id).await.unwrap_err();
    assert!(matches!(err, OrderError::RefundNotEligible { .. }));
    assert_eq!(stock_of(&engine, "A1").await, 2);

    // Once completed, the refund goes through.
    sqlx::query("UPDATE orders SET status = 'completed' WHERE order_id = ?1")
        .bind(placed.order_id)
        .execute(engine.database().pool())
        .await
        .unwrap();

    engine.refund_order(placed.order_id).await.unwrap();
    assert_eq!(stock_of(&engine, "A1").await, 5);
}

// =============================================================================
// Status
// =============================================================================

/// Backdates an order's created_at, to age it past the delivery window.
async fn backdate(engine: &OrderEngine, order_id: i64, days: i64) {
    let created_at = Utc::now() - Duration::days(days);
    sqlx::query("UPDATE orders SET created_at = ?1 WHERE order_id = ?2")
        .bind(created_at)
        .bind(order_id)
        .execute(engine.database().pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn fresh_order_reports_expected_delivery() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();

    let report = engine.order_status(placed.order_id).await.unwrap();
    assert_eq!(report.status, OrderStatus::Pending);
    assert_eq!(report.total_price_cents, 3000);
    assert_eq!(
        report.estimated_delivery,
        report.created_at + Duration::days(7)
    );
    assert!(report.message.starts_with("Delivery expected by"));
}

#[tokio::test]
async fn eight_day_old_pending_order_reports_delay() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();
    backdate(&engine, placed.order_id, 8).await;

    let report = engine.order_status(placed.order_id).await.unwrap();
    assert!(report.message.contains("delayed"));
    assert!(report.message.contains("contact support"));
}

#[tokio::test]
async fn overdue_refunded_order_expects_no_delivery() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 3)]))
        .await
        .unwrap();
    engine.refund_order(placed.order_id).await.unwrap();
    backdate(&engine, placed.order_id, 8).await;

    let report = engine.order_status(placed.order_id).await.unwrap();
    assert_eq!(report.status, OrderStatus::Refunded);
    assert!(report.message.contains("No delivery is expected"));
}

#[tokio::test]
async fn status_of_unknown_order_fails() {
    let engine = engine_with(&[("A1", 5, 1000)]).await;

    let err = engine.order_status(7).await.unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(7)));
}

// =============================================================================
// Notifications
// =============================================================================

/// Forwards confirmations into a channel the test can await.
struct ForwardingNotifier {
    tx: mpsc::UnboundedSender<OrderConfirmation>,
}

#[async_trait]
impl Notifier for ForwardingNotifier {
    async fn notify(&self, confirmation: OrderConfirmation) -> Result<(), NotifyError> {
        self.tx
            .send(confirmation)
            .map_err(|e| NotifyError(e.to_string()))
    }
}

#[tokio::test]
async fn successful_placement_dispatches_a_confirmation() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let now = Utc::now();
    db.products()
        .insert(&Product {
            sku: "A1".into(),
            stock: 5,
            price_cents: 1000,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (notifications, _worker) = spawn_notification_worker(ForwardingNotifier { tx });
    let engine = OrderEngine::new(
        db,
        Arc::new(StaticUserDirectory::with_users([USER])),
        notifications,
        EngineConfig::default(),
    );

    let placed = engine
        .place_order(&request(vec![LineItem::new("A1", 1)]))
        .await
        .unwrap();

    let confirmation = rx.recv().await.unwrap();
    assert_eq!(confirmation.user_id, USER);
    assert_eq!(confirmation.order_id, placed.order_id);
}

#[tokio::test]
async fn failed_placement_dispatches_nothing() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (notifications, _worker) = spawn_notification_worker(ForwardingNotifier { tx });
    let engine = OrderEngine::new(
        db,
        Arc::new(StaticUserDirectory::with_users([USER])),
        notifications,
        EngineConfig::default(),
    );

    let _ = engine
        .place_order(&request(vec![LineItem::new("GHOST", 1)]))
        .await
        .unwrap_err();

    assert!(rx.try_recv().is_err());
}
