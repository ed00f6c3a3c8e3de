use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Coalescing, capacity-one "there may be work" notification.
///
/// `post` never blocks. While a notification is already buffered, further posts are
/// dropped: the condition is re-checked by whichever worker consumes the buffered one.
#[derive(Debug, Default)]
pub struct WakeSignal {
    pending: AtomicBool,
    notify: Notify,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a wake-up. Returns `false` when one was already pending and this post coalesced.
    pub fn post(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_one();
        true
    }

    /// Waits for a buffered wake-up and consumes it.
    pub async fn wait(&self) {
        self.notify.notified().await;
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
