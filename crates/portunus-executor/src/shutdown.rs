//! Cooperative shutdown signal.
//!
//! A small, cloneable signal used to stop background work deterministically:
//! the session store's expiry sweeper subscribes to one, and embedding
//! applications can wire it to SIGTERM handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// A signal that can be triggered once and awaited by many tasks.
///
/// All clones observe the same trigger. Triggering is idempotent, and a
/// listener that subscribes after the trigger still completes immediately.
///
/// # Example
///
/// ```
/// use portunus_executor::ShutdownSignal;
///
/// let signal = ShutdownSignal::new();
/// let observer = signal.clone();
/// signal.trigger();
/// assert!(observer.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    sender: broadcast::Sender<()>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Triggers the signal, waking every listener. Idempotent.
    pub fn trigger(&self) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Nobody listening is fine.
            let _ = self.sender.send(());
        }
    }

    /// Returns true once the signal has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Completes when the signal is triggered. Returns immediately if it
    /// already was.
    pub async fn recv(&self) {
        if self.is_triggered() {
            return;
        }
        let mut receiver = self.sender.subscribe();
        // Re-check after subscribing so a trigger between the check and the
        // subscription is not missed.
        if self.is_triggered() {
            return;
        }
        let _ = receiver.recv().await;
    }
}
