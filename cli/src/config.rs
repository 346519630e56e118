//! CLI configuration

use anyhow::Context;
use rehydra_core::{PersistConfig, StateMap, StorageConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything a session needs, loadable from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Mediator options
    pub persist: PersistConfig,

    /// Durable store backend
    pub storage: StorageConfig,

    /// Initial application state before rehydration
    pub defaults: StateMap,
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.persist.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `$XDG_DATA_HOME/rehydra/store`, falling back to `./data/rehydra`
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("rehydra").join("store"))
        .unwrap_or_else(|| PathBuf::from("./data/rehydra"))
}
