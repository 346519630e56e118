//! Log sink handed to the mediator

use rehydra_core::RehydraError;
use std::fmt;
use tracing::{debug, error};

/// Destination for mediator diagnostics and caught failures
pub trait PersistLogger: Send + Sync {
    /// Phase trace line, only called when `log` is enabled
    fn trace(&self, message: fmt::Arguments<'_>);

    /// A failure caught at the mediator boundary
    fn error(&self, error: &RehydraError);
}

/// Forwards to `tracing` under the `rehydra::persist` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl PersistLogger for TracingLogger {
    fn trace(&self, message: fmt::Arguments<'_>) {
        debug!(target: "rehydra::persist", "{}", message);
    }

    fn error(&self, err: &RehydraError) {
        error!(target: "rehydra::persist", "{}", err);
    }
}
