use async_trait::async_trait;
use orderflow::application::engine::DispatchEngine;
use orderflow::config::EngineConfig;
use orderflow::domain::order::{Order, OrderStatus, OrderUpdate, Priority, StatusReport};
use orderflow::domain::ports::{OrderStore, OrderStoreRef};
use orderflow::error::Result;
use orderflow::infrastructure::in_memory::InMemoryOrderStore;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

mod common;

fn start(engine: &DispatchEngine, cancel: &CancellationToken) -> JoinHandle<Result<()>> {
    let engine = engine.clone();
    let cancel = cancel.clone();
    tokio::spawn(async move { engine.run(cancel).await })
}

#[tokio::test(start_paused = true)]
async fn test_outcomes_settle_within_budget() {
    let store = Arc::new(InMemoryOrderStore::new());
    let engine = DispatchEngine::new(store, EngineConfig::new(2, 5, 1).unwrap());
    let cancel = CancellationToken::new();
    let runner = start(&engine, &cancel);

    let started = Instant::now();
    engine.create_order("A", Priority::High, 2).await.unwrap();
    engine.create_order("B", Priority::Normal, 10).await.unwrap();

    let a = common::wait_terminal(&engine, "A").await;
    let a_elapsed = started.elapsed();
    assert_eq!(a.status, OrderStatus::Processed);
    assert!(a_elapsed >= Duration::from_secs(2) && a_elapsed < Duration::from_millis(2_500));

    // Bounded by the 5s budget, not the requested 10s
    let b = common::wait_terminal(&engine, "B").await;
    let b_elapsed = started.elapsed();
    assert_eq!(b.status, OrderStatus::Failed);
    assert!(b_elapsed >= Duration::from_secs(5) && b_elapsed < Duration::from_millis(5_500));

    cancel.cancel();
    runner.await.unwrap().unwrap();

    // No workers left, so C stays Pending
    engine.create_order("C", Priority::High, 1).await.unwrap();

    let report = engine.status_report().await.unwrap();
    let expected: StatusReport = [OrderStatus::Pending, OrderStatus::Processed, OrderStatus::Failed]
        .into_iter()
        .collect();
    assert_eq!(report, expected);
}

#[tokio::test(start_paused = true)]
async fn test_order_queries_are_idempotent() {
    let engine = DispatchEngine::new(
        Arc::new(InMemoryOrderStore::new()),
        EngineConfig::new(1, 5, 1).unwrap(),
    );
    let cancel = CancellationToken::new();
    let runner = start(&engine, &cancel);

    engine.create_order("A", Priority::Normal, 1).await.unwrap();
    let settled = common::wait_terminal(&engine, "A").await;

    let first = engine.get_order("A").await.unwrap();
    let second = engine.get_order("A").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, settled);
    assert_eq!(engine.get_order_by_id(first.id).await.unwrap(), first);

    cancel.cancel();
    runner.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rapid_submissions_coalesce_and_still_drain() {
    let engine = DispatchEngine::new(
        Arc::new(InMemoryOrderStore::new()),
        EngineConfig::new(1, 5, 1).unwrap(),
    );
    let cancel = CancellationToken::new();
    let runner = start(&engine, &cancel);

    // Keep the only worker busy
    engine.create_order("busy", Priority::High, 3).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.get_order("busy").await.unwrap().lock);

    for i in 0..20 {
        engine
            .create_order(format!("burst-{i}"), Priority::Normal, 1)
            .await
            .unwrap();
    }
    assert!(engine.signal().is_pending());
    assert!(!engine.signal().post(), "only one wake-up may be buffered");

    engine
        .settled(Duration::from_millis(100), &cancel)
        .await
        .unwrap();

    let report = engine.status_report().await.unwrap();
    assert_eq!(report.count(OrderStatus::Processed), 21);
    assert_eq!(report.count(OrderStatus::Pending), 0);

    cancel.cancel();
    runner.await.unwrap().unwrap();
}

/// Wraps the in-memory store and counts successful claims per order.
#[derive(Default)]
struct ClaimCountingStore {
    inner: InMemoryOrderStore,
    claims: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl OrderStore for ClaimCountingStore {
    async fn create(&self, order: Order) -> Result<()> {
        self.inner.create(order).await
    }
    async fn get_by_id(&self, id: Uuid) -> Result<Order> {
        self.inner.get_by_id(id).await
    }
    async fn get_by_order_id(&self, order_id: &str) -> Result<Order> {
        self.inner.get_by_order_id(order_id).await
    }
    async fn next_ready(&self) -> Result<Order> {
        self.inner.next_ready().await
    }
    async fn claim(&self, order_id: &str) -> Result<()> {
        self.inner.claim(order_id).await?;
        *self
            .claims
            .lock()
            .unwrap()
            .entry(order_id.to_string())
            .or_default() += 1;
        Ok(())
    }
    async fn update(&self, update: OrderUpdate) -> Result<()> {
        self.inner.update(update).await
    }
    async fn status_report(&self) -> Result<StatusReport> {
        self.inner.status_report().await
    }
    async fn release_stale_claims(&self) -> Result<usize> {
        self.inner.release_stale_claims().await
    }
    async fn all_orders(&self) -> Result<Vec<Order>> {
        self.inner.all_orders().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_backlog_processed_exactly_once_by_pool() {
    let counting = Arc::new(ClaimCountingStore::default());
    let store: OrderStoreRef = counting.clone();
    let engine = DispatchEngine::new(store.clone(), EngineConfig::new(8, 2, 1).unwrap());

    let mut submissions: Vec<(String, Priority, u32)> = (0..200)
        .map(|i| {
            let priority = if i % 4 == 0 { Priority::High } else { Priority::Normal };
            (format!("ORD-{i}"), priority, (i % 4) as u32 + 1)
        })
        .collect();
    submissions.shuffle(&mut rand::thread_rng());

    let cancel = CancellationToken::new();
    let runner = start(&engine, &cancel);
    for (order_id, priority, processing_time) in submissions {
        engine
            .create_order(order_id, priority, processing_time)
            .await
            .unwrap();
    }

    engine
        .settled(Duration::from_millis(100), &cancel)
        .await
        .unwrap();
    cancel.cancel();
    runner.await.unwrap().unwrap();

    let orders = store.all_orders().await.unwrap();
    assert_eq!(orders.len(), 200);
    for order in &orders {
        assert!(!order.lock, "{} left locked", order.order_id);
        let expected = if order.processing_time <= 2 {
            OrderStatus::Processed
        } else {
            OrderStatus::Failed
        };
        assert_eq!(order.status, expected, "{}", order.order_id);
    }

    let claims = counting.claims.lock().unwrap();
    assert_eq!(claims.len(), 200);
    assert!(claims.values().all(|count| *count == 1));
}

#[tokio::test(start_paused = true)]
async fn test_high_priority_backlog_served_first() {
    let store = Arc::new(InMemoryOrderStore::new());
    let engine = DispatchEngine::new(store, EngineConfig::new(1, 5, 1).unwrap());

    // Submitted before the pool starts, so selection sees the whole backlog
    for i in 0..3 {
        engine
            .create_order(format!("normal-{i}"), Priority::Normal, 1)
            .await
            .unwrap();
    }
    engine.create_order("high-late", Priority::High, 1).await.unwrap();

    let cancel = CancellationToken::new();
    let runner = start(&engine, &cancel);

    let high = common::wait_terminal(&engine, "high-late").await;
    let normal = engine.get_order("normal-0").await.unwrap();
    assert_eq!(high.status, OrderStatus::Processed);
    assert_eq!(normal.status, OrderStatus::Pending);

    engine
        .settled(Duration::from_millis(100), &cancel)
        .await
        .unwrap();
    cancel.cancel();
    runner.await.unwrap().unwrap();
}
