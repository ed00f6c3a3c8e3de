use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Dispatch priority of an order.
///
/// Variants are declared lowest first so the derived `Ord` ranks `High` above `Normal`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum Priority {
    #[serde(alias = "normal")]
    Normal,
    #[serde(alias = "high")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => f.write_str("Normal"),
            Priority::High => f.write_str("High"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processed,
    Failed,
}

impl OrderStatus {
    /// Processed and Failed are final; an order never leaves them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => f.write_str("Pending"),
            OrderStatus::Processed => f.write_str("Processed"),
            OrderStatus::Failed => f.write_str("Failed"),
        }
    }
}

/// A submitted order and its processing state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    /// Identifier assigned by this process at creation.
    pub id: Uuid,
    /// Business identifier supplied by the submitter. Unique per store.
    pub order_id: String,
    pub priority: Priority,
    pub status: OrderStatus,
    /// Requested simulated work, in whole seconds.
    pub processing_time: u32,
    /// Set while exactly one worker owns the order.
    pub lock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_id: impl Into<String>, priority: Priority, processing_time: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id: order_id.into(),
            priority,
            status: OrderStatus::Pending,
            processing_time,
            lock: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending and unclaimed.
    pub fn is_ready(&self) -> bool {
        self.status == OrderStatus::Pending && !self.lock
    }

    pub fn processing_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.processing_time))
    }

    /// Applies the fields present in `update` and refreshes `updated_at`.
    ///
    /// A status change on an order that is already terminal is refused and leaves the
    /// order untouched. Lock-only updates are always applied.
    pub fn apply(&mut self, update: &OrderUpdate) -> Result<()> {
        if let Some(status) = update.status {
            if self.status.is_terminal() {
                return Err(OrderError::ValidationError(format!(
                    "order {} is already {}, refusing {}",
                    self.order_id, self.status, status
                )));
            }
            self.status = status;
        }
        if let Some(lock) = update.lock {
            self.lock = lock;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Selection order for ready orders: higher priority first, then oldest first.
///
/// High always beats Normal regardless of age. `order_id` breaks exact timestamp ties
/// so the result is total.
pub fn dispatch_order(a: &Order, b: &Order) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.order_id.cmp(&b.order_id))
}

/// Partial update keyed by `order_id`. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub order_id: String,
    pub status: Option<OrderStatus>,
    pub lock: Option<bool>,
}

impl OrderUpdate {
    /// Writes the final status and hands the order back.
    pub fn finalize(order_id: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.into(),
            status: Some(status),
            lock: Some(false),
        }
    }
}

/// Order counts per status. Statuses without orders are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport(BTreeMap<OrderStatus, usize>);

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, status: OrderStatus) {
        *self.0.entry(status).or_default() += 1;
    }

    pub fn count(&self, status: OrderStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrderStatus, usize)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }
}

impl FromIterator<OrderStatus> for StatusReport {
    fn from_iter<I: IntoIterator<Item = OrderStatus>>(iter: I) -> Self {
        let mut report = Self::new();
        for status in iter {
            report.record(status);
        }
        report
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (status, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{status}: {count}")?;
            first = false;
        }
        Ok(())
    }
}
