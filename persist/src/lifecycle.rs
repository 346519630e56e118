//! Restore-then-run lifecycle gate

use rehydra_core::Lifecycle;
use tokio::sync::watch;

/// What to do with a state-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// First notification: start the restore
    Restore,
    /// Ready: run a save pass
    Save,
    /// Restore in flight: ignore
    Drop,
}

/// INIT → RESTORING → READY, observable through a watch channel
pub struct LifecycleGate {
    state: watch::Sender<Lifecycle>,
}

impl LifecycleGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Lifecycle::Init);
        Self { state }
    }

    pub fn current(&self) -> Lifecycle {
        *self.state.borrow()
    }

    /// Classify a notification, moving INIT to RESTORING on the first one
    pub fn observe(&self) -> Gate {
        let mut gate = Gate::Drop;
        self.state.send_if_modified(|state| match *state {
            Lifecycle::Init => {
                *state = Lifecycle::Restoring;
                gate = Gate::Restore;
                true
            }
            Lifecycle::Restoring => false,
            Lifecycle::Ready => {
                gate = Gate::Save;
                false
            }
        });
        gate
    }

    /// Terminal transition; later calls are no-ops
    pub fn mark_ready(&self) {
        self.state.send_if_modified(|state| {
            if *state == Lifecycle::Ready {
                false
            } else {
                *state = Lifecycle::Ready;
                true
            }
        });
    }

    /// Resolve once READY is reached
    pub async fn wait_ready(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|state| *state == Lifecycle::Ready).await;
    }
}

impl Default for LifecycleGate {
    fn default() -> Self {
        Self::new()
    }
}
