//! Error types for Rehydra

use thiserror::Error;

/// Main error type for Rehydra
#[derive(Error, Debug)]
pub enum RehydraError {
    // ============ Storage Errors ============
    #[error("Storage read failed: {0}")]
    StorageRead(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // ============ Encoding Errors ============
    #[error("Serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Invalid key {0}: missing prefix")]
    InvalidKey(String),

    // ============ Lifecycle Errors ============
    #[error("No async runtime available: {0}")]
    Runtime(String),

    #[error("Persistence worker stopped")]
    WorkerStopped,

    #[error("{event} listener panicked: {message}")]
    ListenerPanicked { event: String, message: String },

    #[error("Reducer panicked on {action}: {message}")]
    DispatchPanicked { action: String, message: String },

    #[error("{job} job panicked: {message}")]
    JobPanicked { job: String, message: String },

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RehydraError {
    /// Build a serialization error for a field or encoded key
    pub fn serialization(key: impl Into<String>, reason: impl ToString) -> Self {
        RehydraError::Serialization {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for RehydraError {
    fn from(err: std::io::Error) -> Self {
        RehydraError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for RehydraError {
    fn from(err: serde_json::Error) -> Self {
        RehydraError::Config(err.to_string())
    }
}

/// Result type for Rehydra operations
pub type RehydraResult<T> = Result<T, RehydraError>;
