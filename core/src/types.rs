//! Core types for Rehydra
//!
//! Defines the data shapes shared between the mediator and its collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Application state: top-level field name → serializable value
pub type StateMap = serde_json::Map<String, Value>;

/// Action type that merges persisted values over the current state
pub const REHYDRATE: &str = "REHYDRATE";

/// An action dispatched through a state container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Build the reconciliation action carrying restored fields
    pub fn rehydrate(payload: StateMap) -> Self {
        Self::new(REHYDRATE, Value::Object(payload))
    }

    pub fn is_rehydrate(&self) -> bool {
        self.kind == REHYDRATE
    }
}

/// Root reducer: (current state, action) → next state
pub type Reducer = Arc<dyn Fn(StateMap, &Action) -> StateMap + Send + Sync>;

/// Wrap a closure as a [`Reducer`]
pub fn reducer<F>(f: F) -> Reducer
where
    F: Fn(StateMap, &Action) -> StateMap + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Callback invoked after every committed state change
pub type Subscriber = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Mediator lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// No state change observed yet
    Init,
    /// Restore in flight; changes are dropped
    Restoring,
    /// Normal operation; changes are saved
    Ready,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Init
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Init => write!(f, "INIT"),
            Lifecycle::Restoring => write!(f, "RESTORING"),
            Lifecycle::Ready => write!(f, "READY"),
        }
    }
}

/// Events published to external listeners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistEvent {
    /// A batch of changed fields was written
    Save,
    /// Persisted fields were merged back into the container
    Restore,
}

impl PersistEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PersistEvent::Save => "save",
            PersistEvent::Restore => "restore",
        }
    }
}

impl fmt::Display for PersistEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
