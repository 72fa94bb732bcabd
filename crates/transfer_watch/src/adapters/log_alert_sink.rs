// Rust guideline compliant 2026-10-16

//! Demo adapter for the `AlertSink` port.
//!
//! Logs each alert via `tracing::warn!`. Never blocks, never fails.

use domain::{Alert, AlertSink};

/// `AlertSink` adapter that emits a warning log for each alert.
///
/// Stands in for a display surface; use a custom implementation for real
/// alert routing.
#[derive(Debug)]
pub struct LogAlertSink;

impl LogAlertSink {
    /// Create a new log sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogAlertSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for LogAlertSink {
    fn emit(&self, alert: &Alert) {
        tracing::warn!(
            alert_id = %alert.id,
            category = %alert.category,
            severity = alert.severity,
            accounts = ?alert.accounts,
            "log_alert_sink.alert: {}",
            alert.message
        );
    }
}
