//! Field selection for persistence

use rehydra_core::PersistConfig;
use std::collections::HashSet;

/// Decides which top-level fields are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    /// Only listed fields
    Allow(HashSet<String>),
    /// Every field except the listed ones
    Deny(HashSet<String>),
    /// Every field
    All,
}

impl KeyFilter {
    /// Build from config; the whitelist wins when both lists are set
    pub fn from_config(config: &PersistConfig) -> Self {
        if let Some(whitelist) = &config.whitelist {
            KeyFilter::Allow(whitelist.iter().cloned().collect())
        } else if let Some(blacklist) = &config.blacklist {
            KeyFilter::Deny(blacklist.iter().cloned().collect())
        } else {
            KeyFilter::All
        }
    }

    pub fn allows(&self, key: &str) -> bool {
        match self {
            KeyFilter::Allow(keys) => keys.contains(key),
            KeyFilter::Deny(keys) => !keys.contains(key),
            KeyFilter::All => true,
        }
    }
}

impl Default for KeyFilter {
    fn default() -> Self {
        KeyFilter::All
    }
}
