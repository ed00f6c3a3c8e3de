use crate::domain::order::OrderStatus;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of one simulated processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: OrderStatus,
    pub elapsed: Duration,
}

/// Terminal status for work of `processing_time` under a `budget`.
///
/// Work that fits the budget exactly still succeeds.
pub fn outcome_for(processing_time: Duration, budget: Duration) -> OrderStatus {
    if processing_time <= budget {
        OrderStatus::Processed
    } else {
        OrderStatus::Failed
    }
}

/// Simulates processing by racing a work timer against a deadline timer.
///
/// Whichever timer fires first ends the wait, so the elapsed time is
/// `min(processing_time, budget)`. The status itself comes from [`outcome_for`]; the race
/// only decides how long the caller is held. Cancellation during the wait yields `Failed`.
pub async fn simulate(
    processing_time: Duration,
    budget: Duration,
    cancel: &CancellationToken,
) -> Outcome {
    let started = Instant::now();
    let work = tokio::time::sleep(processing_time);
    let deadline = tokio::time::sleep(budget);

    let status = tokio::select! {
        biased;
        _ = cancel.cancelled() => OrderStatus::Failed,
        _ = work => outcome_for(processing_time, budget),
        _ = deadline => outcome_for(processing_time, budget),
    };

    Outcome {
        status,
        elapsed: started.elapsed(),
    }
}
