// Rust guideline compliant 2026-10-16

//! Append-only transfer log with a trailing-window query.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use domain::Transfer;
use parking_lot::RwLock;

/// Insertion-ordered record of every ingested transfer.
///
/// Appends take the write lock; window reads take the read lock, so a reader
/// sees the log either before or after a concurrent append, never halfway.
/// Nothing is ever removed.
#[derive(Debug, Default)]
pub struct TransferLog {
    entries: RwLock<Vec<Arc<Transfer>>>,
}

impl TransferLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `transfer` at the tail. O(1) amortized.
    pub fn append(&self, transfer: Arc<Transfer>) {
        self.entries.write().push(transfer);
    }

    /// Append a transfer built from its insertion position.
    ///
    /// `build` receives the sequence number the entry will occupy and runs
    /// under the write lock, so sequence numbers match log positions even with
    /// concurrent appenders.
    pub fn append_with(&self, build: impl FnOnce(u64) -> Transfer) -> Arc<Transfer> {
        let mut entries = self.entries.write();
        let seq = entries.len() as u64;
        let transfer = Arc::new(build(seq));
        entries.push(Arc::clone(&transfer));
        transfer
    }

    /// Transfers with `now - duration <= timestamp <= now`, most recent first.
    ///
    /// Scans backward from the tail and stops at the first transfer older than
    /// the cutoff. Assumes insertion order is timestamp non-decreasing: a
    /// transfer inserted after an older one that stops the scan is not
    /// returned. Transfers dated after `now` are skipped without ending the
    /// scan. Cost is proportional to the window size, not the log size.
    #[must_use]
    pub fn recent_window(&self, now: DateTime<Utc>, duration: TimeDelta) -> Vec<Arc<Transfer>> {
        let cutoff = now.checked_sub_signed(duration).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let entries = self.entries.read();
        entries
            .iter()
            .rev()
            .take_while(|t| t.timestamp >= cutoff)
            .filter(|t| t.timestamp <= now)
            .map(Arc::clone)
            .collect()
    }

    /// Most recently appended transfer.
    #[must_use]
    pub fn last(&self) -> Option<Arc<Transfer>> {
        self.entries.read().last().map(Arc::clone)
    }

    /// Number of transfers appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// `true` if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::TransferLog;
    use chrono::{DateTime, TimeDelta, Utc};
    use domain::{AccountId, Metadata, Transfer};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn make_tx(seq: u64, offset_secs: i64) -> Arc<Transfer> {
        Arc::new(Transfer {
            seq,
            sender: AccountId::from_index(0),
            receiver: AccountId::from_index(1),
            amount: 100.0,
            timestamp: t0() + TimeDelta::seconds(offset_secs),
            metadata: Metadata::new(),
        })
    }

    fn seqs(window: &[Arc<Transfer>]) -> Vec<u64> {
        window.iter().map(|t| t.seq).collect()
    }

    // TL-T01: window returns in-range transfers, most recent first.
    #[test]
    fn window_most_recent_first() {
        let log = TransferLog::new();
        for (seq, offset) in [(0, 0), (1, 10), (2, 20), (3, 30)] {
            log.append(make_tx(seq, offset));
        }

        let window = log.recent_window(t0() + TimeDelta::seconds(35), TimeDelta::seconds(20));
        assert_eq!(seqs(&window), [3, 2]);
    }

    // TL-T02: cutoff is inclusive; nothing older is ever returned.
    #[test]
    fn cutoff_is_inclusive() {
        let log = TransferLog::new();
        for (seq, offset) in [(0, 0), (1, 5), (2, 10)] {
            log.append(make_tx(seq, offset));
        }

        let now = t0() + TimeDelta::seconds(65);
        let window = log.recent_window(now, TimeDelta::seconds(60));
        assert_eq!(seqs(&window), [2, 1]);
        assert!(window.iter().all(|t| t.timestamp >= now - TimeDelta::seconds(60)));
    }

    // TL-T03: out-of-order insertions hidden behind an older entry are skipped.
    #[test]
    fn backward_scan_stops_at_first_old_entry() {
        let log = TransferLog::new();
        log.append(make_tx(0, 50));
        log.append(make_tx(1, 0)); // late arrival with an old timestamp
        log.append(make_tx(2, 55));

        let window = log.recent_window(t0() + TimeDelta::seconds(60), TimeDelta::seconds(30));
        // seq 0 is inside the window but sits behind seq 1, which stops the scan.
        assert_eq!(seqs(&window), [2]);
    }

    // TL-T04: two reads with no append in between are identical.
    #[test]
    fn window_read_is_idempotent() {
        let log = TransferLog::new();
        for seq in 0..10 {
            log.append(make_tx(seq, i64::try_from(seq).unwrap()));
        }
        let now = t0() + TimeDelta::seconds(10);
        let first = log.recent_window(now, TimeDelta::seconds(5));
        let second = log.recent_window(now, TimeDelta::seconds(5));
        assert_eq!(first, second);
    }

    // TL-T05: huge durations do not overflow.
    #[test]
    fn huge_duration_returns_everything() {
        let log = TransferLog::new();
        log.append(make_tx(0, 0));
        log.append(make_tx(1, 1));
        let window = log.recent_window(t0() + TimeDelta::seconds(1), TimeDelta::MAX);
        assert_eq!(seqs(&window), [1, 0]);
    }

    // TL-T07: entries dated after `now` are left out but do not end the scan.
    #[test]
    fn future_dated_entries_excluded() {
        let log = TransferLog::new();
        log.append(make_tx(0, 10));
        log.append(make_tx(1, 3_600)); // clock-skewed sender
        log.append(make_tx(2, 20));
        log.append(make_tx(3, 7_200));

        let now = t0() + TimeDelta::seconds(30);
        let window = log.recent_window(now, TimeDelta::seconds(60));
        assert_eq!(seqs(&window), [2, 0]);
        assert!(window.iter().all(|t| t.timestamp <= now));

        // Exactly `now` is still inside.
        let window = log.recent_window(t0() + TimeDelta::seconds(20), TimeDelta::seconds(5));
        assert_eq!(seqs(&window), [2]);
    }

    // TL-T06: append_with numbers entries by position, even across threads.
    #[test]
    fn append_with_assigns_positions() {
        let log = TransferLog::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        log.append_with(|seq| Transfer { seq, ..(*make_tx(0, 0)).clone() });
                    }
                });
            }
        });

        assert_eq!(log.len(), 400);
        let all = log.recent_window(t0(), TimeDelta::seconds(1));
        let mut got = seqs(&all);
        got.reverse();
        assert_eq!(got, (0..400).collect::<Vec<u64>>());
        assert_eq!(log.last().map(|t| t.seq), Some(399));
    }
}
