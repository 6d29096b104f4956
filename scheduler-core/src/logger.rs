//! The scheduler's logging collaborator.
//!
//! The scheduler itself only ever needs two severities: a warning for the
//! first dropped occurrence of a schedule, and nothing louder than that —
//! everything else is either a debug-level trace or outside this crate's
//! concern. [`TracingLogger`] is the production implementation, backed by
//! the `tracing` crate.

use std::sync::Arc;

/// Named interface the scheduler logs through. A container wires in
/// whichever component was registered under the `Logger` config key.
pub trait Logger: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Logs through `tracing::warn!`/`tracing::error!`, tagging every event
/// with the logger's configured name as a structured field.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        TracingLogger { name: name.into() }
    }
}

impl Logger for TracingLogger {
    fn warn(&self, message: &str) {
        tracing::warn!(logger = %self.name, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(logger = %self.name, "{message}");
    }
}

/// Discards everything. Useful for tests and for callers that have no
/// interest in scheduler diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

pub fn tracing_logger(name: impl Into<String>) -> Arc<dyn Logger> {
    Arc::new(TracingLogger::new(name))
}
