//! Core traits defining Rehydra interfaces
//!
//! These traits describe the collaborators the mediator is wired to.

use crate::error::RehydraResult;
use crate::types::*;
use async_trait::async_trait;

/// Batched asynchronous string key-value store
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read many keys at once; missing keys come back as `None`
    async fn multi_get(&self, keys: &[String]) -> RehydraResult<Vec<(String, Option<String>)>>;

    /// Write many pairs as one batch
    async fn multi_set(&self, pairs: Vec<(String, String)>) -> RehydraResult<()>;

    /// Remove many keys as one batch
    async fn multi_remove(&self, keys: &[String]) -> RehydraResult<()>;

    /// List every key currently held
    async fn all_keys(&self) -> RehydraResult<Vec<String>>;
}

/// Central mutable state container
pub trait StateContainer: Send + Sync {
    /// Current state snapshot
    fn get_state(&self) -> StateMap;

    /// Run an action through the active reducer and notify subscribers
    fn dispatch(&self, action: Action);

    /// Register a change listener
    fn subscribe(&self, listener: Subscriber) -> SubscriptionId;

    /// Remove a change listener
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Install a new root reducer
    fn replace_reducer(&self, reducer: Reducer);
}
