use crate::application::signal::WakeSignal;
use crate::application::simulator::simulate;
use crate::config::EngineConfig;
use crate::domain::order::{Order, OrderStatus, OrderUpdate, Priority, StatusReport};
use crate::domain::ports::OrderStoreRef;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Summary of one order taken through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedOrder {
    pub order_id: String,
    pub status: OrderStatus,
    pub elapsed: Duration,
}

/// Accepts orders and drives a fixed pool of workers that process them.
///
/// Submissions persist the order and post a coalescing wake-up. Each woken worker takes
/// the best ready order through select, claim, simulate and finalize. The engine is cheap
/// to clone; clones share the store and the wake-up signal.
#[derive(Clone)]
pub struct DispatchEngine {
    store: OrderStoreRef,
    signal: Arc<WakeSignal>,
    config: EngineConfig,
}

impl DispatchEngine {
    /// Creates a new `DispatchEngine` over `store`.
    ///
    /// # Arguments
    ///
    /// * `store` - The order store shared by every worker.
    /// * `config` - Worker count and processing timeout budget.
    pub fn new(store: OrderStoreRef, config: EngineConfig) -> Self {
        Self {
            store,
            signal: Arc::new(WakeSignal::new()),
            config,
        }
    }

    pub fn signal(&self) -> &WakeSignal {
        &self.signal
    }

    /// Persists a new Pending order and wakes a worker.
    ///
    /// Returns as soon as the order is stored; the outcome is observed through
    /// [`DispatchEngine::get_order`].
    pub async fn create_order(
        &self,
        order_id: impl Into<String>,
        priority: Priority,
        processing_time: u32,
    ) -> Result<()> {
        let order = Order::new(order_id, priority, processing_time);
        let order_id = order.order_id.clone();

        self.store.create(order).await?;
        info!(%order_id, %priority, processing_time, "order created");

        if self.signal.post() {
            debug!(%order_id, "wake-up posted");
        } else {
            debug!(%order_id, "wake-up already pending, post coalesced");
        }
        Ok(())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.store.get_by_order_id(order_id).await
    }

    pub async fn get_order_by_id(&self, id: Uuid) -> Result<Order> {
        self.store.get_by_id(id).await
    }

    pub async fn status_report(&self) -> Result<StatusReport> {
        self.store.status_report().await
    }

    /// Runs `worker_count` workers until `cancel` fires, then waits for all of them.
    ///
    /// Claims left behind by a previous process are released first, and one wake-up is
    /// posted so any stored backlog starts draining without a new submission.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let released = self.store.release_stale_claims().await?;
        if released > 0 {
            warn!(released, "released stale order claims");
        }
        self.signal.post();

        let worker_count = self.config.worker_count;
        info!(worker_count, "starting order processing workers");

        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            let engine = self.clone();
            let cancel = cancel.clone();
            workers.spawn(async move { engine.work(worker, cancel).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "order worker terminated abnormally");
            }
        }

        info!("all order workers stopped");
        Ok(())
    }

    async fn work(&self, worker: usize, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(worker, "cancelled, stopping worker");
                    return;
                }
                _ = self.signal.wait() => {}
            }

            match self.process_next(&cancel).await {
                Ok(Some(done)) => info!(
                    worker,
                    order_id = %done.order_id,
                    status = %done.status,
                    elapsed_ms = done.elapsed.as_millis() as u64,
                    "order finished"
                ),
                Ok(None) => debug!(worker, "no ready order"),
                Err(err) if err.is_not_found() => {
                    debug!(worker, error = %err, "order claimed elsewhere, skipping")
                }
                Err(err) => error!(worker, error = %err, "error processing order"),
            }
        }
    }

    /// Takes the best ready order through claim, simulation and write-back.
    ///
    /// Returns `Ok(None)` when nothing is ready. A lost claim surfaces as `NotFound` and the
    /// order is left for whoever won it, including when the winner has already finished it. When a candidate is found the wake-up is re-armed
    /// before claiming, so another worker can start on the next order in parallel while an
    /// empty store lets workers park.
    pub async fn process_next(&self, cancel: &CancellationToken) -> Result<Option<ProcessedOrder>> {
        let candidate = match self.store.next_ready().await {
            Ok(order) => order,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };
        let processing_time = candidate.processing_duration();
        let order_id = candidate.order_id;

        self.signal.post();

        self.store.claim(&order_id).await?;
        debug!(%order_id, priority = %candidate.priority, "order claimed");

        let outcome = simulate(processing_time, self.config.process_timeout, cancel).await;

        if let Err(err) = self
            .store
            .update(OrderUpdate::finalize(order_id.as_str(), outcome.status))
            .await
        {
            error!(%order_id, error = %err, "failed to write order outcome");
            self.release_failed(&order_id).await;
            return Err(err);
        }

        Ok(Some(ProcessedOrder {
            order_id,
            status: outcome.status,
            elapsed: outcome.elapsed,
        }))
    }

    /// Best effort: hands a claimed order back as Failed so it is never stranded locked.
    async fn release_failed(&self, order_id: &str) {
        match self
            .store
            .update(OrderUpdate::finalize(order_id, OrderStatus::Failed))
            .await
        {
            Ok(()) => warn!(%order_id, "claimed order released as failed"),
            Err(err) => error!(%order_id, error = %err, "failed to release claimed order"),
        }
    }

    /// Resolves once no order is Pending, polling every `poll`, or when `cancel` fires.
    pub async fn settled(&self, poll: Duration, cancel: &CancellationToken) -> Result<()> {
        loop {
            if self.status_report().await?.count(OrderStatus::Pending) == 0 {
                return Ok(());
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}
