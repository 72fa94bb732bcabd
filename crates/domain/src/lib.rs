// Rust guideline compliant 2026-10-16

//! Shared domain types for the transfer-graph risk engine.
//!
//! Defines `Account`, `Transfer`, `Alert`, the error enums, and the port
//! traits: `GraphView`, `Detector`, `AlertSink`, `TransferSink`, and `Clock`.
//! Every other crate in the workspace depends on this one; it depends on no
//! workspace crate.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

/// Lowest risk score an account can hold.
pub const MIN_RISK: f64 = 0.0;

/// Highest risk score an account can hold.
pub const MAX_RISK: f64 = 1.0;

/// Clamp `score` into `[MIN_RISK, MAX_RISK]`.
#[must_use]
pub fn clamp_risk(score: f64) -> f64 {
    score.clamp(MIN_RISK, MAX_RISK)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Stable handle to an account owned by an account registry.
///
/// Handles are issued by the registry only; two handles are equal iff they
/// designate the same account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(usize);

impl AccountId {
    /// Wrap a registry slot index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Registry slot index behind this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Point-in-time copy of an account held by the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Registry handle.
    pub id: AccountId,
    /// Opaque external identifier (e.g. `"ACC-042"`).
    pub name: Arc<str>,
    /// Risk score in `[MIN_RISK, MAX_RISK]`.
    pub risk: f64,
}

/// Which side of a transfer an identifier was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    /// Account debited by the transfer.
    Sender,
    /// Account credited by the transfer.
    Receiver,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Receiver => f.write_str("receiver"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Free-form string annotations attached to a transfer.
pub type Metadata = BTreeMap<String, String>;

/// One directed, timestamped movement of funds between two accounts.
///
/// Shared as `Arc<Transfer>` once appended; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Insertion position in the transfer log, starting at 0.
    pub seq: u64,
    /// Debited account.
    pub sender: AccountId,
    /// Credited account.
    pub receiver: AccountId,
    /// Non-negative, finite amount.
    pub amount: f64,
    /// Event time as reported by the producer.
    pub timestamp: DateTime<Utc>,
    /// Optional annotations, empty by default.
    pub metadata: Metadata,
}

impl Transfer {
    /// `true` when `sender == receiver`.
    #[must_use]
    pub fn is_self_transfer(&self) -> bool {
        self.sender == self.receiver
    }

    /// `true` when this transfer goes from `from` to `to` (direction matters).
    #[must_use]
    pub fn goes(&self, from: AccountId, to: AccountId) -> bool {
        self.sender == from && self.receiver == to
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Signal raised by a detector for a suspicious pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: uuid::Uuid,
    /// Detector-assigned category tag (e.g. `"rapid ping-pong"`).
    pub category: String,
    /// Human-readable description.
    pub message: String,
    /// Relative weight; not a bounded percentage.
    pub severity: f64,
    /// External identifiers of the implicated accounts.
    pub accounts: Vec<String>,
    /// Store time at which the alert was raised.
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    /// Build an alert with a fresh v4 identifier.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        message: impl Into<String>,
        severity: f64,
        accounts: Vec<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            category: category.into(),
            message: message.into(),
            severity,
            accounts,
            raised_at,
        }
    }

    /// `true` if `account` is among the implicated identifiers.
    #[must_use]
    pub fn implicates(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by detector construction or evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetectorError {
    /// Detector configuration failed validation.
    #[error("invalid detector configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description.
        reason: String,
    },
    /// Evaluation of a transfer could not be completed.
    #[error("evaluation failed: {reason}")]
    Failed {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors returned by the ingestion boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    /// An account identifier was the empty string.
    #[error("{role} account id must not be empty")]
    EmptyAccountId {
        /// Side of the transfer that was empty.
        role: AccountRole,
    },
    /// The amount was negative, NaN, or infinite.
    #[error("amount must be finite and non-negative, got {amount}")]
    InvalidAmount {
        /// Rejected amount.
        amount: f64,
    },
    /// A subscribed detector failed while evaluating the transfer.
    ///
    /// The transfer is already appended when this is returned.
    #[error("detector '{detector}' failed: {source}")]
    Detector {
        /// Name reported by the failing detector.
        detector: String,
        /// Underlying detector error.
        #[source]
        source: DetectorError,
    },
}

// ---------------------------------------------------------------------------
// Clock port
// ---------------------------------------------------------------------------

/// Source of "now" for window queries and alert timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// `Clock` backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `Clock` that only moves when told to.
///
/// Used by tests and by replay-style runs where event time drives the window.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    /// Jump to `instant` (may move backward).
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    /// Move by `delta`, backward when negative. Saturates at the representable
    /// range instead of wrapping.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        let bound = if delta < TimeDelta::zero() { DateTime::<Utc>::MIN_UTC } else { DateTime::<Utc>::MAX_UTC };
        *now = now.checked_add_signed(delta).unwrap_or(bound);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

// ---------------------------------------------------------------------------
// Graph ports
// ---------------------------------------------------------------------------

/// Handle a detector receives during notification.
///
/// Exposes read-only queries plus the two side effects a detector may
/// request: a risk adjustment and an alert emission.
pub trait GraphView {
    /// Current instant according to the store clock.
    fn now(&self) -> DateTime<Utc>;

    /// Transfers with `now - window <= timestamp <= now`, most recent first.
    fn recent_edges(&self, window: TimeDelta) -> Vec<Arc<Transfer>>;

    /// Snapshot of the account behind `id`, `None` for a foreign handle.
    fn account(&self, id: AccountId) -> Option<Account>;

    /// Add `delta` to the risk of `id`, clamped. Returns the new score.
    fn adjust_risk(&self, id: AccountId, delta: f64) -> Option<f64>;

    /// Deliver `alert` to the attached sink, if any.
    fn emit_alert(&self, alert: Alert);
}

/// Pluggable pattern detector notified once per ingested transfer.
///
/// Called synchronously on the ingesting thread. Implementations must not
/// register or unregister detectors from inside `on_transfer_added`.
pub trait Detector: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Evaluate the freshly appended `transfer` against `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::Failed`] when evaluation cannot complete; the
    /// error aborts the ingestion call that triggered it.
    fn on_transfer_added(&self, transfer: &Transfer, graph: &dyn GraphView) -> Result<(), DetectorError>;
}

/// Consumer of emitted alerts (display, logging, queueing).
///
/// Fire-and-forget: implementations must neither block nor fail from the
/// caller's perspective.
pub trait AlertSink: Send + Sync + fmt::Debug {
    /// Receive one alert.
    fn emit(&self, alert: &Alert);
}

/// Ingestion port used by producers.
pub trait TransferSink {
    /// Submit one transfer event.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] for malformed input or a failing detector.
    fn submit(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Arc<Transfer>, IngestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn clamp_risk_bounds() {
        assert!((clamp_risk(-3.5) - MIN_RISK).abs() < f64::EPSILON);
        assert!((clamp_risk(42.0) - MAX_RISK).abs() < f64::EPSILON);
        assert!((clamp_risk(0.25) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn account_id_roundtrip_and_display() {
        let id = AccountId::from_index(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "#7");
        assert_ne!(id, AccountId::from_index(8));
    }

    #[test]
    fn transfer_direction_helpers() {
        let a = AccountId::from_index(0);
        let b = AccountId::from_index(1);
        let tx = Transfer {
            seq: 0,
            sender: a,
            receiver: b,
            amount: 10.0,
            timestamp: t0(),
            metadata: Metadata::new(),
        };
        assert!(tx.goes(a, b));
        assert!(!tx.goes(b, a));
        assert!(!tx.is_self_transfer());

        let loopback = Transfer { receiver: a, ..tx };
        assert!(loopback.is_self_transfer());
    }

    #[test]
    fn alert_new_assigns_distinct_ids() {
        let a1 = Alert::new("x", "m", 0.5, vec!["A".to_owned()], t0());
        let a2 = Alert::new("x", "m", 0.5, vec!["A".to_owned()], t0());
        assert_ne!(a1.id, a2.id);
        assert!(a1.implicates("A"));
        assert!(!a1.implicates("B"));
        assert_eq!(a1.raised_at, t0());
    }

    #[test]
    fn error_messages() {
        let e = IngestError::EmptyAccountId { role: AccountRole::Receiver };
        assert_eq!(e.to_string(), "receiver account id must not be empty");

        let e = IngestError::InvalidAmount { amount: -1.0 };
        assert_eq!(e.to_string(), "amount must be finite and non-negative, got -1");

        let e = IngestError::Detector {
            detector: "rapid_transfer".to_owned(),
            source: DetectorError::Failed { reason: "boom".to_owned() },
        };
        assert_eq!(e.to_string(), "detector 'rapid_transfer' failed: evaluation failed: boom");
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(t0());
        assert_eq!(clock.now(), t0());

        clock.advance(TimeDelta::seconds(5));
        assert_eq!(clock.now(), t0() + TimeDelta::seconds(5));

        clock.set(t0());
        assert_eq!(clock.now(), t0());
    }

    #[test]
    fn manual_clock_advance_saturates() {
        let clock = ManualClock::new(DateTime::<Utc>::MAX_UTC);
        clock.advance(TimeDelta::seconds(1));
        assert_eq!(clock.now(), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn manual_clock_rewind_saturates_at_min() {
        let clock = ManualClock::new(DateTime::<Utc>::MIN_UTC);
        clock.advance(TimeDelta::seconds(-1));
        assert_eq!(clock.now(), DateTime::<Utc>::MIN_UTC);

        let clock = ManualClock::new(DateTime::from_timestamp(0, 0).unwrap());
        clock.advance(TimeDelta::MIN);
        assert_eq!(clock.now(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn system_clock_tracks_wall_clock() {
        let drift = (SystemClock.now() - Utc::now()).num_seconds().abs();
        assert!(drift < 60, "system clock drifted {drift}s from Utc::now");
    }
}
