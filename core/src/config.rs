//! Configuration types for Rehydra

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RehydraError, RehydraResult};

/// Key prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "reduxPersist:";

/// Persistence mediator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Emit diagnostic trace lines for every phase
    pub log: bool,

    /// Namespace prepended to every field name in the durable store
    pub prefix: String,

    /// Only these fields participate in persistence
    pub whitelist: Option<Vec<String>>,

    /// These fields never participate in persistence
    pub blacklist: Option<Vec<String>>,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            log: false,
            prefix: DEFAULT_PREFIX.to_string(),
            whitelist: None,
            blacklist: None,
        }
    }
}

impl PersistConfig {
    /// Restrict persistence to the given fields
    pub fn with_whitelist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Exclude the given fields from persistence
    pub fn with_blacklist<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// Reject configurations that would make encoded keys ambiguous
    pub fn validate(&self) -> RehydraResult<()> {
        if self.prefix.is_empty() {
            return Err(RehydraError::Config("prefix must not be empty".into()));
        }
        Ok(())
    }

    /// Parse from JSON text
    pub fn from_json(json: &str) -> RehydraResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Durable store backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Volatile in-process store
    Memory,
    /// sled database at `path`
    Sled { path: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sled {
            path: PathBuf::from("./data/rehydra"),
        }
    }
}

impl StorageConfig {
    pub fn sled(path: impl AsRef<Path>) -> Self {
        StorageConfig::Sled {
            path: path.as_ref().to_path_buf(),
        }
    }
}
