// Rust guideline compliant 2026-10-16

//! Rapid-transfer (ping-pong) detector.
//!
//! Flags two accounts that move funds back and forth in both directions
//! several times within a short window.

use chrono::TimeDelta;
use domain::{Alert, Detector, DetectorError, GraphView, Transfer};

use crate::account_name;

/// Category tag carried by alerts from [`RapidTransferDetector`].
pub const RAPID_PING_PONG_CATEGORY: &str = "rapid ping-pong";

/// Severity of a ping-pong alert.
const ALERT_SEVERITY: f64 = 0.6;

/// Risk added to each implicated account when a burst is detected.
const RISK_INCREMENT: f64 = 0.03;

// ---------------------------------------------------------------------------
// RapidTransferConfig + builder
// ---------------------------------------------------------------------------

/// Configuration for a [`RapidTransferDetector`], fixed at construction.
///
/// Construct via [`RapidTransferConfig::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct RapidTransferConfig {
    /// Trailing window inspected on every transfer.
    pub window: TimeDelta,
    /// Transfers below this amount are ignored (inclusive threshold).
    pub min_amount: f64,
    /// Minimum qualifying transfers required in *each* direction.
    pub burst_count: usize,
}

/// Builder for [`RapidTransferConfig`].
#[derive(Debug)]
pub struct RapidTransferConfigBuilder {
    window: TimeDelta,
    min_amount: f64,
    burst_count: usize,
}

impl RapidTransferConfig {
    /// Create a builder.
    ///
    /// Default values: `window = 60 s`, `min_amount = 500.0`, `burst_count = 3`.
    #[must_use]
    pub fn builder() -> RapidTransferConfigBuilder {
        RapidTransferConfigBuilder {
            window: TimeDelta::seconds(60),
            min_amount: 500.0,
            burst_count: 3,
        }
    }
}

impl RapidTransferConfigBuilder {
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

    /// Override the per-direction burst threshold.
    #[must_use]
    pub fn burst_count(mut self, burst_count: usize) -> Self {
        self.burst_count = burst_count;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidConfig`] when the window is not
    /// positive, `min_amount` is negative or not finite, or `burst_count` is 0.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<RapidTransferConfig, DetectorError> {
        if self.window <= TimeDelta::zero() {
            return Err(DetectorError::InvalidConfig { reason: "window must be positive".to_owned() });
        }
        if !self.min_amount.is_finite() || self.min_amount < 0.0 {
            return Err(DetectorError::InvalidConfig {
                reason: format!("min_amount must be finite and >= 0, got {}", self.min_amount),
            });
        }
        if self.burst_count == 0 {
            return Err(DetectorError::InvalidConfig { reason: "burst_count must be >= 1".to_owned() });
        }
        Ok(RapidTransferConfig {
            window: self.window,
            min_amount: self.min_amount,
            burst_count: self.burst_count,
        })
    }
}

// ---------------------------------------------------------------------------
// RapidTransferDetector
// ---------------------------------------------------------------------------

/// Detects bidirectional bursts between the two parties of each new transfer.
///
/// For a new transfer `A -> B` it counts qualifying `A -> B` and `B -> A`
/// transfers in the window (the new one included). When both counts reach
/// `burst_count` it raises one alert and bumps both risk scores. No state is
/// kept between calls, so a burst that stays qualifying alerts again on every
/// further transfer between the pair.
#[derive(Debug)]
pub struct RapidTransferDetector {
    config: RapidTransferConfig,
}

impl RapidTransferDetector {
    /// Create a detector from a validated `config`.
    #[must_use]
    pub fn new(config: RapidTransferConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RapidTransferConfig {
        &self.config
    }
}

impl Default for RapidTransferDetector {
    fn default() -> Self {
        Self::new(RapidTransferConfig {
            window: TimeDelta::seconds(60),
            min_amount: 500.0,
            burst_count: 3,
        })
    }
}

impl Detector for RapidTransferDetector {
    fn name(&self) -> &str {
        "rapid_transfer"
    }

    fn on_transfer_added(&self, edge: &Transfer, graph: &dyn GraphView) -> Result<(), DetectorError> {
        let window = graph.recent_edges(self.config.window);

        let mut ab_count = 0usize;
        let mut ba_count = 0usize;
        for e in window.iter().filter(|e| e.amount >= self.config.min_amount) {
            if e.goes(edge.sender, edge.receiver) {
                ab_count += 1;
            }
            if e.goes(edge.receiver, edge.sender) {
                ba_count += 1;
            }
        }

        if ab_count < self.config.burst_count || ba_count < self.config.burst_count {
            return Ok(());
        }

        let sender = account_name(graph, edge.sender)?;
        let receiver = account_name(graph, edge.receiver)?;

        // Implicated accounts form a set: a self-transfer burst names one account.
        graph.adjust_risk(edge.sender, RISK_INCREMENT);
        let accounts = if edge.is_self_transfer() {
            vec![sender.clone()]
        } else {
            graph.adjust_risk(edge.receiver, RISK_INCREMENT);
            vec![sender.clone(), receiver.clone()]
        };

        tracing::info!(
            sender = %sender,
            receiver = %receiver,
            ab_count,
            ba_count,
            seq = edge.seq,
            "rapid_transfer.alert"
        );

        let message = format!(
            "rapid ping-pong between {sender} and {receiver}: {ab_count} out, {ba_count} back within {}s",
            self.config.window.num_seconds()
        );
        graph.emit_alert(Alert::new(
            RAPID_PING_PONG_CATEGORY,
            message,
            ALERT_SEVERITY,
            accounts,
            graph.now(),
        ));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{RAPID_PING_PONG_CATEGORY, RapidTransferConfig, RapidTransferDetector};
    use crate::test_support::CollectingSink;
    use chrono::{DateTime, TimeDelta, Utc};
    use domain::{
        Account, AccountId, Alert, Detector as _, DetectorError, GraphView, ManualClock, Metadata, Transfer,
    };
    use graph::{GraphStore, GraphStoreConfig};
    use std::sync::Arc;

    // ------------------------------------------------------------------
    // Test helpers
    // ------------------------------------------------------------------

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn secs(n: i64) -> TimeDelta {
        TimeDelta::seconds(n)
    }

    struct Harness {
        clock: Arc<ManualClock>,
        store: GraphStore,
        sink: Arc<CollectingSink>,
    }

    impl Harness {
        fn new(min_amount: f64, burst_count: usize) -> Self {
            let clock = Arc::new(ManualClock::new(t0()));
            let store_clock: Arc<ManualClock> = Arc::clone(&clock);
            let store = GraphStore::with_config(GraphStoreConfig::builder().clock(store_clock).build().unwrap());
            let sink = Arc::new(CollectingSink::default());
            let store_sink: Arc<CollectingSink> = Arc::clone(&sink);
            store.set_alert_sink(store_sink);

            let config = RapidTransferConfig::builder()
                .window(secs(60))
                .min_amount(min_amount)
                .burst_count(burst_count)
                .build()
                .unwrap();
            store.register_observer(Arc::new(RapidTransferDetector::new(config)));
            Self { clock, store, sink }
        }

        /// Submit at `t0 + offset` with the clock moved to the same instant.
        fn submit(&self, from: &str, to: &str, amount: f64, offset: i64) {
            self.clock.set(t0() + secs(offset));
            self.store.add_transaction(from, to, amount, t0() + secs(offset)).unwrap();
        }

        /// The canonical six-step A/B ping-pong, asserting alert counts per step.
        fn ping_pong(&self, amount: f64) -> Vec<usize> {
            (0..6)
                .map(|i| {
                    let (from, to) = if i % 2 == 0 { ("A", "B") } else { ("B", "A") };
                    self.submit(from, to, amount, i);
                    self.sink.len()
                })
                .collect()
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    // RT-T01: builder defaults.
    #[test]
    fn builder_defaults() {
        let config = RapidTransferConfig::builder().build().unwrap();
        assert_eq!(config.window, secs(60));
        assert_eq!(config.burst_count, 3);
        assert!((config.min_amount - 500.0).abs() < f64::EPSILON);
        assert_eq!(RapidTransferDetector::default().config(), &config);
    }

    // RT-T02: invalid configurations are rejected.
    #[test]
    fn builder_rejects_invalid() {
        let bad = [
            RapidTransferConfig::builder().window(TimeDelta::zero()).build(),
            RapidTransferConfig::builder().window(secs(-5)).build(),
            RapidTransferConfig::builder().min_amount(-1.0).build(),
            RapidTransferConfig::builder().min_amount(f64::NAN).build(),
            RapidTransferConfig::builder().burst_count(0).build(),
        ];
        for result in bad {
            assert!(
                matches!(result, Err(DetectorError::InvalidConfig { .. })),
                "expected InvalidConfig, got {result:?}"
            );
        }
    }

    // ------------------------------------------------------------------
    // Detection scenarios
    // ------------------------------------------------------------------

    // RT-T03: six alternating $1000 transfers alert exactly once, on the sixth.
    #[test]
    fn six_step_ping_pong_alerts_on_sixth() {
        let h = Harness::new(500.0, 3);
        assert_eq!(h.ping_pong(1_000.0), [0, 0, 0, 0, 0, 1]);

        let alerts = h.sink.alerts();
        let alert = &alerts[0];
        assert_eq!(alert.category, RAPID_PING_PONG_CATEGORY);
        assert!((alert.severity - 0.6).abs() < f64::EPSILON);
        let mut accounts = alert.accounts.clone();
        accounts.sort();
        assert_eq!(accounts, ["A", "B"]);
        assert_eq!(alert.raised_at, t0() + secs(5));
    }

    // RT-T04: min_amount above every transfer filters everything out.
    #[test]
    fn min_amount_filters_all() {
        let h = Harness::new(1_500.0, 3);
        assert_eq!(h.ping_pong(1_000.0), [0; 6]);
    }

    // RT-T05: burst_count = 4 never fires on a 3 + 3 burst.
    #[test]
    fn burst_four_never_fires() {
        let h = Harness::new(500.0, 4);
        assert_eq!(h.ping_pong(1_000.0), [0; 6]);
        assert_eq!(h.store.alerts_emitted(), 0);
    }

    // RT-T06: amount equal to min_amount counts.
    #[test]
    fn threshold_is_inclusive() {
        let h = Harness::new(500.0, 3);
        assert_eq!(h.ping_pong(500.0), [0, 0, 0, 0, 0, 1]);
    }

    // RT-T07: both directions must qualify (AND, not OR).
    #[test]
    fn one_sided_burst_does_not_fire() {
        let h = Harness::new(500.0, 3);
        for i in 0..10 {
            h.submit("A", "B", 1_000.0, i);
        }
        h.submit("B", "A", 1_000.0, 10);
        h.submit("B", "A", 1_000.0, 11);
        assert_eq!(h.sink.len(), 0);
    }

    // RT-T08: a still-qualifying window re-alerts on each further transfer.
    #[test]
    fn repeated_alerts_without_cooldown() {
        let h = Harness::new(500.0, 3);
        h.ping_pong(1_000.0);
        h.submit("A", "B", 1_000.0, 6);
        h.submit("B", "A", 1_000.0, 7);
        assert_eq!(h.sink.len(), 3);
    }

    // RT-T09: transfers that fell out of the window are not counted.
    #[test]
    fn expired_transfers_not_counted() {
        let h = Harness::new(500.0, 3);
        for i in 0..3 {
            h.submit("A", "B", 1_000.0, i);
        }
        for i in 0..3 {
            h.submit("B", "A", 1_000.0, 90 + i);
        }
        assert_eq!(h.sink.len(), 0);
    }

    // RT-T10: unrelated pairs do not contribute to each other's counts.
    #[test]
    fn other_pairs_ignored() {
        let h = Harness::new(500.0, 3);
        for i in 0..3 {
            h.submit("A", "B", 1_000.0, i);
            h.submit("C", "A", 1_000.0, i);
            h.submit("B", "C", 1_000.0, i);
        }
        assert_eq!(h.sink.len(), 0);
    }

    // RT-T11: an alert adds the detector increment on top of the ingest nudges.
    #[test]
    fn alert_raises_risk() {
        let h = Harness::new(500.0, 3);
        h.ping_pong(1_000.0);
        let risk = h.store.registry().risk_of("A").unwrap();
        // Six ingest nudges of 0.005 plus one detector increment of 0.03.
        assert!((risk - 0.06).abs() < 1e-9, "risk was {risk}");
    }

    // RT-T12: unregistering mid-stream stops alerts and keeps earlier ones.
    #[test]
    fn unregister_mid_stream() {
        let clock = Arc::new(ManualClock::new(t0()));
        let store_clock: Arc<ManualClock> = Arc::clone(&clock);
        let store = GraphStore::with_config(GraphStoreConfig::builder().clock(store_clock).build().unwrap());
        let sink = Arc::new(CollectingSink::default());
        let store_sink: Arc<CollectingSink> = Arc::clone(&sink);
        store.set_alert_sink(store_sink);
        let id = store.register_observer(Arc::new(RapidTransferDetector::default()));

        for i in 0..6 {
            let (from, to) = if i % 2 == 0 { ("A", "B") } else { ("B", "A") };
            clock.set(t0() + secs(i));
            store.add_transaction(from, to, 1_000.0, t0() + secs(i)).unwrap();
        }
        assert_eq!(sink.len(), 1);

        assert!(store.unregister_observer(id));
        clock.set(t0() + secs(6));
        store.add_transaction("A", "B", 1_000.0, t0() + secs(6)).unwrap();
        assert_eq!(sink.len(), 1);
    }

    // ------------------------------------------------------------------
    // Isolation from the store
    // ------------------------------------------------------------------

    /// Minimal view over a fixed window with no registry.
    #[derive(Default)]
    struct BareView {
        window: Vec<Arc<Transfer>>,
        alerts: parking_lot::Mutex<Vec<Alert>>,
    }

    impl GraphView for BareView {
        fn now(&self) -> DateTime<Utc> {
            t0()
        }

        fn recent_edges(&self, _window: TimeDelta) -> Vec<Arc<Transfer>> {
            self.window.clone()
        }

        fn account(&self, _id: AccountId) -> Option<Account> {
            None
        }

        fn adjust_risk(&self, _id: AccountId, _delta: f64) -> Option<f64> {
            None
        }

        fn emit_alert(&self, alert: Alert) {
            self.alerts.lock().push(alert);
        }
    }

    fn bare_tx(seq: u64, from: usize, to: usize) -> Arc<Transfer> {
        Arc::new(Transfer {
            seq,
            sender: AccountId::from_index(from),
            receiver: AccountId::from_index(to),
            amount: 1_000.0,
            timestamp: t0(),
            metadata: Metadata::new(),
        })
    }

    // RT-T13: below threshold the detector never touches the view.
    #[test]
    fn below_threshold_is_silent_on_bare_view() {
        let view = BareView { window: vec![bare_tx(1, 1, 0), bare_tx(0, 0, 1)], ..BareView::default() };
        let detector = RapidTransferDetector::default();
        detector.on_transfer_added(&view.window[0], &view).unwrap();
        assert!(view.alerts.lock().is_empty());
    }

    // RT-T14: a qualifying burst on a view without accounts is an evaluation failure.
    #[test]
    fn unknown_accounts_fail_evaluation() {
        let window: Vec<_> = (0..6).map(|i| if i % 2 == 0 { bare_tx(i, 0, 1) } else { bare_tx(i, 1, 0) }).collect();
        let view = BareView { window, ..BareView::default() };
        let detector = RapidTransferDetector::default();
        let result = detector.on_transfer_added(&view.window[5], &view);
        assert!(matches!(result, Err(DetectorError::Failed { .. })), "got {result:?}");
        assert!(view.alerts.lock().is_empty());
    }

    // RT-T15: a self-transfer burst implicates its single account once.
    #[test]
    fn self_transfer_burst_names_account_once() {
        let h = Harness::new(500.0, 3);
        for offset in 0..3 {
            h.submit("A", "A", 1_000.0, offset);
        }

        assert_eq!(h.sink.len(), 1);
        let alert = &h.sink.alerts()[0];
        assert_eq!(alert.accounts, ["A"]);
        assert!(alert.implicates("A"));
    }

    // RT-T16: a transfer dated ahead of the clock is not counted toward a burst.
    #[test]
    fn future_dated_transfer_not_counted() {
        let h = Harness::new(500.0, 3);
        h.clock.set(t0());
        h.store.add_transaction("A", "B", 1_000.0, t0() + secs(3_600)).unwrap();
        for offset in [0, 2, 4] {
            h.submit("B", "A", 1_000.0, offset);
        }
        h.submit("A", "B", 1_000.0, 5);
        h.submit("A", "B", 1_000.0, 6);
        // Only two in-window A->B transfers: the one an hour ahead is outside.
        assert_eq!(h.sink.len(), 0);
        h.submit("A", "B", 1_000.0, 7);
        assert_eq!(h.sink.len(), 1);
    }
}
