//! Save/restore notifications for external observers

use parking_lot::RwLock;
use rehydra_core::{PersistEvent, RehydraError, StateMap};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::logger::PersistLogger;

/// Callback receiving an event payload
pub type Listener = Arc<dyn Fn(&StateMap) + Send + Sync>;

/// Wrap a closure as a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&StateMap) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Named listener lists, keyed by event
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<PersistEvent, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; re-adding the same `Arc` moves it to the back
    pub fn add(&self, event: PersistEvent, listener: Listener) {
        let mut handlers = self.handlers.write();
        let list = handlers.entry(event).or_default();
        list.retain(|existing| !Arc::ptr_eq(existing, &listener));
        list.push(listener);
    }

    /// Unregister `listener`; unknown listeners are ignored
    pub fn remove(&self, event: PersistEvent, listener: &Listener) {
        let mut handlers = self.handlers.write();
        if let Some(list) = handlers.get_mut(&event) {
            list.retain(|existing| !Arc::ptr_eq(existing, listener));
            if list.is_empty() {
                handlers.remove(&event);
            }
        }
    }

    pub fn listener_count(&self, event: PersistEvent) -> usize {
        self.handlers.read().get(&event).map_or(0, Vec::len)
    }

    /// Call every listener in registration order.
    ///
    /// A panicking listener is reported to `logger` and the remaining
    /// listeners still run.
    pub fn emit(&self, event: PersistEvent, payload: &StateMap, logger: &dyn PersistLogger) {
        // Snapshot so listeners may add or remove listeners
        let listeners = match self.handlers.read().get(&event) {
            Some(list) => list.clone(),
            None => return,
        };

        for listener in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(payload)));
            if let Err(cause) = outcome {
                logger.error(&RehydraError::ListenerPanicked {
                    event: event.to_string(),
                    message: panic_message(cause.as_ref()),
                });
            }
        }
    }
}

pub(crate) fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
