//! Persistent durable store using sled database

use async_trait::async_trait;
use rehydra_core::{DurableStore, RehydraError, RehydraResult};
use sled::{Db, Tree};
use std::path::Path;
use tracing::debug;

const STATE_TREE: &str = "persist";

/// Durable store backed by a sled tree
pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> RehydraResult<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| RehydraError::Storage(e.to_string()))?;

        let tree = db
            .open_tree(STATE_TREE)
            .map_err(|e| RehydraError::Storage(e.to_string()))?;

        debug!("Opened sled store at {}", path.as_ref().display());

        Ok(Self { db, tree })
    }

    /// Open a throwaway database that is removed on drop
    pub fn temporary() -> RehydraResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| RehydraError::Storage(e.to_string()))?;
        let tree = db
            .open_tree(STATE_TREE)
            .map_err(|e| RehydraError::Storage(e.to_string()))?;
        Ok(Self { db, tree })
    }

    fn read(&self, key: &str) -> RehydraResult<Option<String>> {
        let value = self
            .tree
            .get(key.as_bytes())
            .map_err(|e| RehydraError::StorageRead(e.to_string()))?;

        match value {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| RehydraError::StorageRead(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    /// Number of stored entries
    pub fn size_estimate(&self) -> u64 {
        self.tree.len() as u64
    }
}

#[async_trait]
impl DurableStore for SledStore {
    async fn multi_get(&self, keys: &[String]) -> RehydraResult<Vec<(String, Option<String>)>> {
        keys.iter()
            .map(|key| Ok((key.clone(), self.read(key)?)))
            .collect()
    }

    async fn multi_set(&self, pairs: Vec<(String, String)>) -> RehydraResult<()> {
        // Create a batch for atomic writes
        let mut batch = sled::Batch::default();
        for (key, value) in &pairs {
            batch.insert(key.as_bytes(), value.as_bytes());
        }

        self.tree
            .apply_batch(batch)
            .map_err(|e| RehydraError::StorageWrite(e.to_string()))?;

        // Flush to disk
        self.db
            .flush_async()
            .await
            .map_err(|e| RehydraError::StorageWrite(e.to_string()))?;

        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> RehydraResult<()> {
        let mut batch = sled::Batch::default();
        for key in keys {
            batch.remove(key.as_bytes());
        }

        self.tree
            .apply_batch(batch)
            .map_err(|e| RehydraError::StorageWrite(e.to_string()))?;
        self.db
            .flush_async()
            .await
            .map_err(|e| RehydraError::StorageWrite(e.to_string()))?;

        Ok(())
    }

    async fn all_keys(&self) -> RehydraResult<Vec<String>> {
        self.tree
            .iter()
            .keys()
            .map(|result| {
                let key = result.map_err(|e| RehydraError::StorageRead(e.to_string()))?;
                String::from_utf8(key.to_vec()).map_err(|e| RehydraError::StorageRead(e.to_string()))
            })
            .collect()
    }
}
