// Rust guideline compliant 2026-10-16

//! Account registry: identity arena plus per-account risk scores.

use std::collections::HashMap;
use std::sync::Arc;

use domain::{Account, AccountId, clamp_risk};
use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// Inner state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Slot {
    name: Arc<str>,
    risk: f64,
}

#[derive(Debug, Default)]
struct RegistryInner {
    index: HashMap<Arc<str>, AccountId>,
    /// Arena; an `AccountId` is a position in this vector.
    slots: Vec<Slot>,
}

// ---------------------------------------------------------------------------
// AccountRegistry
// ---------------------------------------------------------------------------

/// Owns every known account and hands out stable [`AccountId`] handles.
///
/// Accounts are created lazily with risk `0.0` and never removed, so a handle
/// stays valid for the registry's lifetime. Lookup and creation are
/// synchronized by one `RwLock`: a read-locked fast path for known ids, and
/// check-then-insert under the write lock for new ones.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    inner: RwLock<RegistryInner>,
}

impl AccountRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `name`, creating the account if absent.
    ///
    /// Concurrent callers racing on the same new `name` all receive the same
    /// handle.
    pub fn get_or_create(&self, name: &str) -> AccountId {
        if let Some(&id) = self.inner.read().index.get(name) {
            return id;
        }

        let mut inner = self.inner.write();
        // Re-check: another writer may have inserted between the two locks.
        if let Some(&id) = inner.index.get(name) {
            return id;
        }
        let id = AccountId::from_index(inner.slots.len());
        let name: Arc<str> = Arc::from(name);
        inner.slots.push(Slot { name: Arc::clone(&name), risk: 0.0 });
        inner.index.insert(name, id);
        tracing::debug!(account = %id, "account_registry.created");
        id
    }

    /// Handle for `name` if the account exists.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<AccountId> {
        self.inner.read().index.get(name).copied()
    }

    /// Snapshot of the account behind `id`.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<Account> {
        let inner = self.inner.read();
        inner.slots.get(id.index()).map(|slot| Account {
            id,
            name: Arc::clone(&slot.name),
            risk: slot.risk,
        })
    }

    /// Risk score of the account named `name`.
    #[must_use]
    pub fn risk_of(&self, name: &str) -> Option<f64> {
        let inner = self.inner.read();
        let id = inner.index.get(name)?;
        inner.slots.get(id.index()).map(|slot| slot.risk)
    }

    /// Apply `clamp(current + delta, 0.0, 1.0)` and return the new score.
    ///
    /// Returns `None` when `id` was not issued by this registry. `delta` must
    /// be finite.
    pub fn adjust_risk(&self, id: AccountId, delta: f64) -> Option<f64> {
        let mut inner = self.inner.write();
        let slot = inner.slots.get_mut(id.index())?;
        slot.risk = clamp_risk(slot.risk + delta);
        Some(slot.risk)
    }

    /// Copy of every account, in creation order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Account> {
        let inner = self.inner.read();
        inner
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| Account {
                id: AccountId::from_index(i),
                name: Arc::clone(&slot.name),
                risk: slot.risk,
            })
            .collect()
    }

    /// Number of known accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().slots.len()
    }

    /// `true` if no account has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
