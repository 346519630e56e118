//! Key and value encoding for the durable store
//!
//! Keys are `prefix + field`. Values are JSON text.

use rehydra_core::{RehydraError, RehydraResult};
use serde_json::Value;

/// Encodes field names and values into durable-store strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn encode_key(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }

    /// Strip the leading prefix; keys without it are rejected
    pub fn decode_key<'a>(&self, encoded: &'a str) -> RehydraResult<&'a str> {
        encoded
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| RehydraError::InvalidKey(encoded.to_string()))
    }

    pub fn owns(&self, encoded: &str) -> bool {
        encoded.starts_with(self.prefix.as_str())
    }

    pub fn encode_value(&self, field: &str, value: &Value) -> RehydraResult<String> {
        serde_json::to_string(value).map_err(|e| RehydraError::serialization(field, e))
    }

    pub fn decode_value(&self, field: &str, encoded: &str) -> RehydraResult<Value> {
        serde_json::from_str(encoded).map_err(|e| RehydraError::serialization(field, e))
    }
}
