use super::order::{Order, OrderUpdate, StatusReport};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Durable record store for orders.
///
/// Implementations must apply `claim` atomically per record: of any number of concurrent
/// claims on the same ready order, exactly one may succeed.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order. Fails with `Duplicate` if the `order_id` already exists.
    async fn create(&self, order: Order) -> Result<()>;
    async fn get_by_id(&self, id: Uuid) -> Result<Order>;
    async fn get_by_order_id(&self, order_id: &str) -> Result<Order>;
    /// Best ready order: Pending, unlocked, highest priority, oldest first.
    async fn next_ready(&self) -> Result<Order>;
    /// Sets `lock` if and only if the order is Pending and unlocked. `NotFound` when
    /// nothing changed.
    async fn claim(&self, order_id: &str) -> Result<()>;
    /// Applies a partial update. A status change on a terminal order is refused with
    /// `ValidationError`.
    async fn update(&self, update: OrderUpdate) -> Result<()>;
    async fn status_report(&self) -> Result<StatusReport>;
    /// Unlocks every Pending order that is still claimed, returning how many were released.
    async fn release_stale_claims(&self) -> Result<usize>;
    async fn all_orders(&self) -> Result<Vec<Order>>;
}

pub type OrderStoreRef = Arc<dyn OrderStore>;
