//! Diagnostics sink
//!
//! Components that silently degrade a configuration (for example an unusable
//! history capacity falling back to unbounded) report it through a sink that
//! is handed to them at construction, rather than through process-wide state.

use std::sync::Mutex;

/// Receiver for degraded-configuration notices
pub trait Diagnostics: Send + Sync {
    /// Report a degraded configuration
    ///
    /// # Arguments
    ///
    /// * `component` - Short name of the reporting component (e.g. "history")
    /// * `message` - Human-readable description of what was degraded
    fn degraded(&self, component: &'static str, message: &str);
}

/// Forwards notices to `tracing` at WARN level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn degraded(&self, component: &'static str, message: &str) {
        tracing::warn!(component, "{}", message);
    }
}

/// Keeps every notice in memory
///
/// Useful when the caller wants to inspect or re-emit notices later.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    notices: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices recorded so far, oldest first
    pub fn notices(&self) -> Vec<(&'static str, String)> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn degraded(&self, component: &'static str, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((component, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let diag = RecordingDiagnostics::new();
        assert!(diag.is_empty());

        diag.degraded("history", "first");
        diag.degraded("config", "second");

        let notices = diag.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0], ("history", "first".to_string()));
        assert_eq!(notices[1].0, "config");
    }

    #[test]
    fn test_tracing_diagnostics_without_subscriber() {
        // No subscriber installed: must be a no-op, not a panic
        TracingDiagnostics.degraded("history", "ignored");
    }
}
