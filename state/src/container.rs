//! In-process state container
//!
//! A reducer-driven store: every dispatched action is folded into the
//! current state by the active reducer, then subscribers are notified.
//! Reducers must not call back into the container. A reducer that panics
//! leaves the state as it was and notifies nobody.

use parking_lot::RwLock;
use rehydra_core::{
    Action, Reducer, StateContainer, StateMap, Subscriber, SubscriptionId,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Action dispatched once when a store is created
pub const INIT_ACTION: &str = "@@rehydra/INIT";

/// Action dispatched after the root reducer is replaced
pub const REPLACE_ACTION: &str = "@@rehydra/REPLACE";

/// Reducer-driven state container
pub struct Store {
    state: RwLock<StateMap>,
    reducer: RwLock<Reducer>,
    subscribers: RwLock<BTreeMap<SubscriptionId, Subscriber>>,
    next_id: AtomicU64,
}

impl Store {
    /// Create a store, running the reducer once over `preloaded`
    pub fn new(reducer: Reducer, preloaded: StateMap) -> Self {
        let initial = reducer(preloaded, &Action::new(INIT_ACTION, Value::Null));

        Self {
            state: RwLock::new(initial),
            reducer: RwLock::new(reducer),
            subscribers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Swap the root reducer without dispatching anything
    pub fn set_reducer(&self, reducer: Reducer) {
        *self.reducer.write() = reducer;
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn notify(&self) {
        // Clone the list so subscribers may subscribe or dispatch
        let subscribers: Vec<Subscriber> = self.subscribers.read().values().cloned().collect();
        for subscriber in subscribers {
            subscriber();
        }
    }
}

impl StateContainer for Store {
    fn get_state(&self) -> StateMap {
        self.state.read().clone()
    }

    fn dispatch(&self, action: Action) {
        trace!(action = %action.kind, "dispatch");

        let reducer = self.reducer.read().clone();
        {
            let mut state = self.state.write();
            let next = reducer(state.clone(), &action);
            *state = next;
        }

        self.notify();
    }

    fn subscribe(&self, listener: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    fn replace_reducer(&self, reducer: Reducer) {
        self.set_reducer(reducer);
        self.dispatch(Action::new(REPLACE_ACTION, Value::Null));
    }
}

/// Thread-safe container wrapper
pub type SharedStore = Arc<Store>;

/// Create a shared state container
pub fn create_store(reducer: Reducer, preloaded: StateMap) -> SharedStore {
    Arc::new(Store::new(reducer, preloaded))
}
