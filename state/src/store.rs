//! Durable store selection

use rehydra_core::{DurableStore, RehydraResult, StorageConfig};
use std::sync::Arc;
use tracing::info;

use crate::memory::MemoryStore;
use crate::persistent::SledStore;

/// Type-erased durable store handle
pub type SharedDurableStore = Arc<dyn DurableStore>;

/// Open the backend described by `config`
pub fn open_store(config: &StorageConfig) -> RehydraResult<SharedDurableStore> {
    match config {
        StorageConfig::Memory => {
            info!("Using in-memory durable store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageConfig::Sled { path } => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            info!("Using sled durable store at {}", path.display());
            Ok(Arc::new(SledStore::open(path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_memory_store() {
        let store = open_store(&StorageConfig::Memory).unwrap();

        store.multi_set(vec![("k".into(), "1".into())]).await.unwrap();
        assert_eq!(store.all_keys().await.unwrap(), vec!["k"]);
    }

    #[tokio::test]
    async fn test_open_sled_store_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("db");

        let store = open_store(&StorageConfig::sled(&path)).unwrap();
        store.multi_set(vec![("k".into(), "1".into())]).await.unwrap();

        assert!(path.exists());
    }
}
