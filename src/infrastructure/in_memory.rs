use crate::domain::order::{Order, OrderStatus, OrderUpdate, StatusReport, dispatch_order};
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Records {
    orders: HashMap<String, Order>,
    ids: HashMap<Uuid, String>,
}

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<..>>` so clones share the same records. Every mutation runs under the
/// write guard, which is what makes `claim` a per-record compare-and-swap.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<()> {
        let mut records = self.records.write().await;
        if records.orders.contains_key(&order.order_id) {
            return Err(OrderError::Duplicate(order.order_id));
        }
        records.ids.insert(order.id, order.order_id.clone());
        records.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order> {
        let records = self.records.read().await;
        records
            .ids
            .get(&id)
            .and_then(|order_id| records.orders.get(order_id))
            .cloned()
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    async fn get_by_order_id(&self, order_id: &str) -> Result<Order> {
        let records = self.records.read().await;
        records
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    async fn next_ready(&self) -> Result<Order> {
        let records = self.records.read().await;
        records
            .orders
            .values()
            .filter(|order| order.is_ready())
            .min_by(|a, b| dispatch_order(a, b))
            .cloned()
            .ok_or_else(|| OrderError::NotFound("no ready order".to_string()))
    }

    async fn claim(&self, order_id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        match records.orders.get_mut(order_id) {
            Some(order) if order.is_ready() => order.apply(&OrderUpdate {
                order_id: order_id.to_string(),
                status: None,
                lock: Some(true),
            }),
            _ => Err(OrderError::NotFound(order_id.to_string())),
        }
    }

    async fn update(&self, update: OrderUpdate) -> Result<()> {
        let mut records = self.records.write().await;
        let order = records
            .orders
            .get_mut(&update.order_id)
            .ok_or_else(|| OrderError::NotFound(update.order_id.clone()))?;
        order.apply(&update)
    }

    async fn status_report(&self) -> Result<StatusReport> {
        let records = self.records.read().await;
        Ok(records.orders.values().map(|order| order.status).collect())
    }

    async fn release_stale_claims(&self) -> Result<usize> {
        let mut records = self.records.write().await;
        let mut released = 0;
        for order in records.orders.values_mut() {
            if order.lock && order.status == OrderStatus::Pending {
                order.apply(&OrderUpdate {
                    order_id: order.order_id.clone(),
                    status: None,
                    lock: Some(false),
                })?;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn all_orders(&self) -> Result<Vec<Order>> {
        let records = self.records.read().await;
        Ok(records.orders.values().cloned().collect())
    }
}
