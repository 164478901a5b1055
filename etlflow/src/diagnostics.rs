//! Diagnostic sink trait and implementations.
//!
//! The sink is the engine's channel for recoverable complaints, such as a
//! malformed range expression that was downgraded to the full range. A sink
//! never fails and never blocks.

use tracing::error;

/// Trait for diagnostic sinks.
pub trait DiagnosticSink: Send + Sync {
    /// Reports a recoverable error. Must not panic or block.
    fn report_error(&self, message: &str);
}

/// A sink that discards all diagnostics.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl DiagnosticSink for NoOpSink {
    fn report_error(&self, _message: &str) {
        // Intentionally empty - discards all diagnostics
    }
}

/// A sink that logs diagnostics through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report_error(&self, message: &str) {
        error!(target: "etlflow", "{message}");
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: parking_lot::RwLock<Vec<String>>,
}

impl CollectingSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected messages.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.read().clone()
    }

    /// Returns the number of collected messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Returns true if nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Clears all collected messages.
    pub fn clear(&self) {
        self.messages.write().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn report_error(&self, message: &str) {
        self.messages.write().push(message.to_string());
    }
}
