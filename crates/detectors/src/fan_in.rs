// Rust guideline compliant 2026-10-16

//! Fan-in (smurfing) detector: many distinct senders feeding one receiver.

use std::collections::BTreeSet;

use chrono::TimeDelta;
use domain::{Alert, Detector, DetectorError, GraphView, Transfer};

use crate::account_name;

/// Category tag carried by alerts from [`FanInDetector`].
pub const FAN_IN_CATEGORY: &str = "fan-in";

const ALERT_SEVERITY: f64 = 0.4;

/// Risk added to the receiving account when fan-in is detected.
const RISK_INCREMENT: f64 = 0.02;

/// Configuration for a [`FanInDetector`].
///
/// Construct via [`FanInConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct FanInConfig {
    /// Trailing window inspected on every transfer.
    pub window: TimeDelta,
    /// Transfers below this amount are ignored (inclusive threshold).
    pub min_amount: f64,
    /// Distinct senders into one receiver that trigger an alert.
    pub distinct_senders: usize,
}

/// Builder for [`FanInConfig`].
#[derive(Debug)]
pub struct FanInConfigBuilder {
    window: TimeDelta,
    min_amount: f64,
    distinct_senders: usize,
}

impl FanInConfig {
    /// Create a builder.
    ///
    /// Default values: `window = 300 s`, `min_amount = 0.0`, `distinct_senders = 5`.
    #[must_use]
    pub fn builder() -> FanInConfigBuilder {
        FanInConfigBuilder { window: TimeDelta::seconds(300), min_amount: 0.0, distinct_senders: 5 }
    }
}

impl FanInConfigBuilder {
    /// Override the trailing window.
    #[must_use]
    pub fn window(mut self, window: TimeDelta) -> Self {
        self.window = window;
        self
    }

    /// Override the minimum counted amount.
    #[must_use]
    pub fn min_amount(mut self, min_amount: f64) -> Self {
        self.min_amount = min_amount;
        self
    }

    /// Override the distinct-sender threshold.
    #[must_use]
    pub fn distinct_senders(mut self, distinct_senders: usize) -> Self {
        self.distinct_senders = distinct_senders;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidConfig`] when the window is not
    /// positive, `min_amount` is negative or not finite, or
    /// `distinct_senders < 2`.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<FanInConfig, DetectorError> {
        if self.window <= TimeDelta::zero() {
            return Err(DetectorError::InvalidConfig { reason: "window must be positive".to_owned() });
        }
        if !self.min_amount.is_finite() || self.min_amount < 0.0 {
            return Err(DetectorError::InvalidConfig {
                reason: format!("min_amount must be finite and >= 0, got {}", self.min_amount),
            });
        }
        if self.distinct_senders < 2 {
            return Err(DetectorError::InvalidConfig {
                reason: "distinct_senders must be >= 2".to_owned(),
            });
        }
        Ok(FanInConfig {
            window: self.window,
            min_amount: self.min_amount,
            distinct_senders: self.distinct_senders,
        })
    }
}

/// Flags a receiver collecting qualifying transfers from many distinct senders.
///
/// Self-transfers into the receiver are not counted as a sender.
#[derive(Debug)]
pub struct FanInDetector {
    config: FanInConfig,
}

impl FanInDetector {
    /// Create a detector from a validated `config`.
    #[must_use]
    pub fn new(config: FanInConfig) -> Self {
        Self { config }
    }
}

impl Detector for FanInDetector {
    fn name(&self) -> &str {
        "fan_in"
    }

    fn on_transfer_added(&self, edge: &Transfer, graph: &dyn GraphView) -> Result<(), DetectorError> {
        let senders: BTreeSet<_> = graph
            .recent_edges(self.config.window)
            .iter()
            .filter(|e| e.receiver == edge.receiver && e.sender != edge.receiver)
            .filter(|e| e.amount >= self.config.min_amount)
            .map(|e| e.sender)
            .collect();

        if senders.len() < self.config.distinct_senders {
            return Ok(());
        }

        let receiver = account_name(graph, edge.receiver)?;
        let mut sender_names = senders
            .iter()
            .map(|&id| account_name(graph, id))
            .collect::<Result<Vec<_>, _>>()?;
        sender_names.sort();

        graph.adjust_risk(edge.receiver, RISK_INCREMENT);
        tracing::info!(receiver = %receiver, senders = senders.len(), seq = edge.seq, "fan_in.alert");

        let message = format!(
            "fan-in to {receiver}: {} distinct senders within {}s",
            senders.len(),
            self.config.window.num_seconds()
        );
        let mut accounts = Vec::with_capacity(sender_names.len() + 1);
        accounts.push(receiver);
        accounts.extend(sender_names);
        graph.emit_alert(Alert::new(FAN_IN_CATEGORY, message, ALERT_SEVERITY, accounts, graph.now()));
        Ok(())
    }
}
