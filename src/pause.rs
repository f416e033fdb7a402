use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

/// Process-wide pause flag shared by the producer and consumer loops.
///
/// Loops poll [`is_paused`](Self::is_paused) once per cycle; the consumer
/// also waits on [`changed`](Self::changed) so overlay directives go out as
/// soon as the flag flips.
#[derive(Debug, Clone, Default)]
pub struct PauseController {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    paused: AtomicBool,
    changed: Notify,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::Acquire)
    }

    /// Flip the flag and return the new state.
    pub fn toggle(&self) -> bool {
        let paused = !self.inner.paused.fetch_xor(true, Ordering::AcqRel);
        self.inner.changed.notify_waiters();
        paused
    }

    /// Resolves on the next toggle after this call.
    pub fn changed(&self) -> Notified<'_> {
        self.inner.changed.notified()
    }
}
