//! Foreground/background lifecycle gate.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Process-wide active/inactive signal gating periodic network work.
///
/// The gate is an injectable service, not ambient global state, so it
/// can be substituted in tests. It performs no I/O itself: the host
/// feeds OS-level foreground/background events into [`set_active`],
/// and controllers read [`is_active`] at timer-tick time. The gate is
/// only ever used to pause and resume periodic timers — it never
/// cancels in-flight requests.
///
/// [`set_active`]: LifecycleGate::set_active
/// [`is_active`]: LifecycleGate::is_active
#[derive(Debug)]
pub struct LifecycleGate {
    active: AtomicBool,
    listeners: Mutex<Vec<mpsc::UnboundedSender<bool>>>,
}

impl Default for LifecycleGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleGate {
    /// Creates a gate in the active state.
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Returns the current active flag.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Records a lifecycle transition.
    ///
    /// Idempotent: repeating the current value is a no-op and notifies
    /// nobody. On a real transition every subscriber receives the new
    /// value exactly once, in transition order.
    pub fn set_active(&self, active: bool) {
        let previous = self.active.swap(active, Ordering::SeqCst);
        if previous == active {
            return;
        }
        self.listeners
            .lock()
            .retain(|listener| listener.send(active).is_ok());
    }

    /// Subscribes to lifecycle transitions.
    ///
    /// The unbounded channel guarantees no transition is dropped; a
    /// receiver that falls behind simply observes them in order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<bool> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners.lock().push(sender);
        receiver
    }
}
