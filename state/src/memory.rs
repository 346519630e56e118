//! In-memory durable store for testing and ephemeral sessions

use async_trait::async_trait;
use dashmap::DashMap;
use rehydra_core::{DurableStore, RehydraResult};
use std::collections::BTreeMap;

/// In-memory key-value store
pub struct MemoryStore {
    data: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    pub fn with_data<I, K, V>(data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (key, value) in data {
            store.data.insert(key.into(), value.into());
        }
        store
    }

    /// Read a single raw value
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|v| v.value().clone())
    }

    /// Sorted copy of every entry
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        let new_store = Self::new();
        for entry in self.data.iter() {
            new_store.data.insert(entry.key().clone(), entry.value().clone());
        }
        new_store
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn multi_get(&self, keys: &[String]) -> RehydraResult<Vec<(String, Option<String>)>> {
        Ok(keys
            .iter()
            .map(|key| (key.clone(), self.get(key)))
            .collect())
    }

    async fn multi_set(&self, pairs: Vec<(String, String)>) -> RehydraResult<()> {
        for (key, value) in pairs {
            self.data.insert(key, value);
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> RehydraResult<()> {
        for key in keys {
            self.data.remove(key);
        }
        Ok(())
    }

    async fn all_keys(&self) -> RehydraResult<Vec<String>> {
        let mut keys: Vec<String> = self.data.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}
