use crate::domain::order::{OrderStatus, StatusReport};
use crate::domain::ports::OrderStoreRef;
use crate::error::Result;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Periodically logs how many orders are in each status.
///
/// Read-only: shares nothing with the dispatch path except the store.
pub struct Reporter {
    store: OrderStoreRef,
    interval: Duration,
}

impl Reporter {
    pub fn new(store: OrderStoreRef, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Queries the store once and emits the counts.
    pub async fn report(&self) -> Result<StatusReport> {
        let report = self.store.status_report().await?;
        info!(
            pending = report.count(OrderStatus::Pending),
            processed = report.count(OrderStatus::Processed),
            failed = report.count(OrderStatus::Failed),
            total = report.total(),
            "order status report"
        );
        Ok(report)
    }

    /// Reports every interval until `cancel` fires. Failed queries are logged and skipped.
    pub async fn run(&self, cancel: CancellationToken) -> usize {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut emitted = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return emitted,
                _ = ticker.tick() => match self.report().await {
                    Ok(_) => emitted += 1,
                    Err(err) => warn!(error = %err, "error fetching order status report"),
                },
            }
        }
    }
}
