// Rust guideline compliant 2026-10-16

//! Graph store: the single ingestion entry point.
//!
//! Composes the [`AccountRegistry`] and [`TransferLog`], owns the detector
//! subscription set and the alert sink slot, and implements the
//! `domain::GraphView` handle detectors receive during fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use domain::{
    Account, AccountId, AccountRole, Alert, AlertSink, Clock, Detector, GraphView, IngestError,
    Metadata, SystemClock, Transfer, TransferSink,
};
use parking_lot::RwLock;

use crate::{AccountRegistry, TransferLog};

/// Risk added to both parties of every ingested transfer.
///
/// A liveness signal for display collaborators, not a detection signal.
pub const DEFAULT_INGEST_RISK_NUDGE: f64 = 0.005;

// ---------------------------------------------------------------------------
// GraphConfigError
// ---------------------------------------------------------------------------

/// Errors raised while building a [`GraphStoreConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphConfigError {
    /// The supplied configuration is invalid.
    #[error("invalid graph store configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// GraphStoreConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`GraphStore`].
///
/// Construct via [`GraphStoreConfig::builder`].
#[derive(Debug)]
pub struct GraphStoreConfig {
    /// Risk added to sender and receiver on every ingested transfer.
    pub ingest_risk_nudge: f64,
    /// Source of "now" for window queries and alert timestamps.
    pub clock: Arc<dyn Clock>,
}

/// Builder for [`GraphStoreConfig`].
///
/// Obtain via [`GraphStoreConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct GraphStoreConfigBuilder {
    ingest_risk_nudge: f64,
    clock: Option<Arc<dyn Clock>>,
}

impl GraphStoreConfig {
    /// Create a builder.
    ///
    /// Default values: `ingest_risk_nudge = 0.005`, `clock = SystemClock`.
    #[must_use]
    pub fn builder() -> GraphStoreConfigBuilder {
        GraphStoreConfigBuilder { ingest_risk_nudge: DEFAULT_INGEST_RISK_NUDGE, clock: None }
    }
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self { ingest_risk_nudge: DEFAULT_INGEST_RISK_NUDGE, clock: Arc::new(SystemClock) }
    }
}

impl GraphStoreConfigBuilder {
    /// Override the per-transfer risk nudge.
    #[must_use]
    pub fn ingest_risk_nudge(mut self, nudge: f64) -> Self {
        self.ingest_risk_nudge = nudge;
        self
    }

    /// Replace the system clock (tests, replays).
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphConfigError::InvalidConfig`] when `ingest_risk_nudge` is
    /// not a finite number in `[0, 1]`.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<GraphStoreConfig, GraphConfigError> {
        if !self.ingest_risk_nudge.is_finite() || !(0.0..=1.0).contains(&self.ingest_risk_nudge) {
            return Err(GraphConfigError::InvalidConfig {
                reason: format!("ingest_risk_nudge must be in [0, 1], got {}", self.ingest_risk_nudge),
            });
        }
        Ok(GraphStoreConfig {
            ingest_risk_nudge: self.ingest_risk_nudge,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Handle returned by [`GraphStore::register_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone)]
struct Subscription {
    id: SubscriptionId,
    detector: Arc<dyn Detector>,
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Live transfer graph with synchronous detector fan-out.
///
/// Each substructure has its own lock: registry, log, subscription list and
/// sink slot. The subscription list is copy-on-write: registration swaps in a
/// new `Arc<Vec<_>>`, and notification iterates the snapshot it cloned, so
/// concurrent (un)registration never skips or duplicates an entry mid-fan-out.
#[derive(Debug)]
pub struct GraphStore {
    registry: AccountRegistry,
    log: TransferLog,
    observers: RwLock<Arc<Vec<Subscription>>>,
    next_subscription: AtomicU64,
    sink: RwLock<Option<Arc<dyn AlertSink>>>,
    alerts_emitted: AtomicU64,
    ingest_risk_nudge: f64,
    clock: Arc<dyn Clock>,
}

impl GraphStore {
    /// Create a store with the default configuration and no alert sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphStoreConfig::default())
    }

    /// Create a store from a validated `config`.
    #[must_use]
    pub fn with_config(config: GraphStoreConfig) -> Self {
        Self {
            registry: AccountRegistry::new(),
            log: TransferLog::new(),
            observers: RwLock::new(Arc::new(Vec::new())),
            next_subscription: AtomicU64::new(0),
            sink: RwLock::new(None),
            alerts_emitted: AtomicU64::new(0),
            ingest_risk_nudge: config.ingest_risk_nudge,
            clock: config.clock,
        }
    }

    // -- subscriptions ------------------------------------------------------

    /// Subscribe `detector` to every subsequently ingested transfer.
    ///
    /// Detectors are notified in registration order.
    pub fn register_observer(&self, detector: Arc<dyn Detector>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let name = detector.name().to_owned();
        let mut observers = self.observers.write();
        let mut next = (**observers).clone();
        next.push(Subscription { id, detector });
        *observers = Arc::new(next);
        tracing::info!(detector = %name, subscription = id.0, "graph_store.observer.registered");
        id
    }

    /// Remove the subscription `id`. Returns `false` if it was not active.
    ///
    /// A fan-out already in progress finishes with the snapshot it started with.
    pub fn unregister_observer(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let Some(pos) = observers.iter().position(|s| s.id == id) else {
            return false;
        };
        let mut next = (**observers).clone();
        let removed = next.remove(pos);
        *observers = Arc::new(next);
        tracing::info!(
            detector = removed.detector.name(),
            subscription = id.0,
            "graph_store.observer.unregistered"
        );
        true
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    fn observers_snapshot(&self) -> Arc<Vec<Subscription>> {
        Arc::clone(&*self.observers.read())
    }

    // -- alert sink ---------------------------------------------------------

    /// Attach `sink`, replacing any previous one.
    pub fn set_alert_sink(&self, sink: Arc<dyn AlertSink>) {
        *self.sink.write() = Some(sink);
    }

    /// Detach the current sink; later alerts are dropped.
    pub fn clear_alert_sink(&self) -> Option<Arc<dyn AlertSink>> {
        self.sink.write().take()
    }

    /// Forward `alert` to the attached sink.
    ///
    /// Without a sink the alert is dropped; that is an expected configuration,
    /// not an error. Counted by [`alerts_emitted`](Self::alerts_emitted) either way.
    pub fn emit_alert(&self, alert: Alert) {
        self.alerts_emitted.fetch_add(1, Ordering::Relaxed);
        // Clone the Arc so the sink runs without holding the slot lock.
        let sink = self.sink.read().as_ref().map(Arc::clone);
        match sink {
            Some(sink) => {
                tracing::debug!(alert_id = %alert.id, category = %alert.category, "graph_store.alert.forwarded");
                sink.emit(&alert);
            }
            None => {
                tracing::debug!(alert_id = %alert.id, category = %alert.category, "graph_store.alert.dropped");
            }
        }
    }

    /// Total alerts emitted by detectors since construction.
    #[must_use]
    pub fn alerts_emitted(&self) -> u64 {
        self.alerts_emitted.load(Ordering::Relaxed)
    }

    // -- ingestion ----------------------------------------------------------

    /// Ingest one transfer with empty metadata.
    ///
    /// See [`add_transaction_with_metadata`](Self::add_transaction_with_metadata).
    ///
    /// # Errors
    ///
    /// Same as [`add_transaction_with_metadata`](Self::add_transaction_with_metadata).
    pub fn add_transaction(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Arc<Transfer>, IngestError> {
        self.add_transaction_with_metadata(from, to, amount, timestamp, Metadata::new())
    }

    /// Ingest one transfer and run every subscribed detector on it.
    ///
    /// Resolves or creates both accounts, appends the transfer, nudges both
    /// risk scores, then notifies detectors synchronously in subscription
    /// order. Alerts reach the sink as soon as a detector emits them. Returns
    /// only once every detector has run.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::EmptyAccountId`] or [`IngestError::InvalidAmount`]
    /// before touching any state. Returns [`IngestError::Detector`] when a
    /// detector fails; the transfer stays appended and the remaining detectors
    /// are skipped. A panicking detector unwinds through this call.
    pub fn add_transaction_with_metadata(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
        metadata: Metadata,
    ) -> Result<Arc<Transfer>, IngestError> {
        validate(from, to, amount)?;

        let sender = self.registry.get_or_create(from);
        let receiver = self.registry.get_or_create(to);
        let transfer = self.log.append_with(|seq| Transfer {
            seq,
            sender,
            receiver,
            amount,
            timestamp,
            metadata,
        });

        self.registry.adjust_risk(sender, self.ingest_risk_nudge);
        self.registry.adjust_risk(receiver, self.ingest_risk_nudge);

        tracing::debug!(seq = transfer.seq, from, to, amount, "graph_store.transfer.added");

        self.notify(&transfer)?;
        Ok(transfer)
    }

    fn notify(&self, transfer: &Transfer) -> Result<(), IngestError> {
        let observers = self.observers_snapshot();
        for sub in observers.iter() {
            if let Err(source) = sub.detector.on_transfer_added(transfer, self) {
                tracing::error!(
                    detector = sub.detector.name(),
                    seq = transfer.seq,
                    error = %source,
                    "graph_store.detector.failed"
                );
                return Err(IngestError::Detector { detector: sub.detector.name().to_owned(), source });
            }
        }
        Ok(())
    }

    // -- queries ------------------------------------------------------------

    /// Transfers from the last `duration`, anchored at the store clock.
    #[must_use]
    pub fn recent_edges(&self, duration: TimeDelta) -> Vec<Arc<Transfer>> {
        self.log.recent_window(self.clock.now(), duration)
    }

    /// The `n` riskiest accounts, highest first; ties broken by name.
    #[must_use]
    pub fn top_risk(&self, n: usize) -> Vec<Account> {
        let mut accounts = self.registry.snapshot();
        accounts.sort_by(|a, b| b.risk.total_cmp(&a.risk).then_with(|| a.name.cmp(&b.name)));
        accounts.truncate(n);
        accounts
    }

    /// The account registry.
    #[must_use]
    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// The transfer log.
    #[must_use]
    pub fn log(&self) -> &TransferLog {
        &self.log
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject malformed events at the ingestion boundary.
fn validate(from: &str, to: &str, amount: f64) -> Result<(), IngestError> {
    if from.is_empty() {
        return Err(IngestError::EmptyAccountId { role: AccountRole::Sender });
    }
    if to.is_empty() {
        return Err(IngestError::EmptyAccountId { role: AccountRole::Receiver });
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(IngestError::InvalidAmount { amount });
    }
    Ok(())
}

impl GraphView for GraphStore {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn recent_edges(&self, window: TimeDelta) -> Vec<Arc<Transfer>> {
        GraphStore::recent_edges(self, window)
    }

    fn account(&self, id: AccountId) -> Option<Account> {
        self.registry.account(id)
    }

    fn adjust_risk(&self, id: AccountId, delta: f64) -> Option<f64> {
        self.registry.adjust_risk(id, delta)
    }

    fn emit_alert(&self, alert: Alert) {
        GraphStore::emit_alert(self, alert);
    }
}

impl TransferSink for GraphStore {
    fn submit(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Arc<Transfer>, IngestError> {
        self.add_transaction(from, to, amount, timestamp)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
