use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop signal shared by the pool, its workers and the cache
/// pruner.
///
/// Clones observe the same flag. Workers and the pruner poll it between
/// bounded queue waits, so a cancellation is observed within one poll
/// interval.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Return the token to the non-cancelled state so the owning pool can be
    /// rebuilt after a shutdown.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}
