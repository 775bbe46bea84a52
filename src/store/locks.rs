//! Arena of per-key async mutexes.
//!
//! Writers for different keys never contend; writers for the same key are
//! serialized. Each slot also carries a completion generation so a waiter can
//! tell whether another holder finished work for the key while it was queued,
//! and whether that work failed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

const PRUNE_THRESHOLD: usize = 64;

#[derive(Default)]
struct Slot {
    lock: Arc<tokio::sync::Mutex<()>>,
    generation: AtomicU64,
    failure: Mutex<Option<KeyFailure>>,
}

/// Outcome of a failed computation, shared with requests that queued behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFailure {
    pub reason: String,
    pub retryable: bool,
}

pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Slot>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() > PRUNE_THRESHOLD {
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    pub async fn lock(&self, key: &K) -> KeyGuard {
        let slot = self.slot(key);
        let observed = slot.generation.load(Ordering::Acquire);
        let guard = Arc::clone(&slot.lock).lock_owned().await;
        KeyGuard {
            _guard: guard,
            slot,
            observed,
        }
    }

    /// Number of keys currently tracked (idle slots may linger until pruned).
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive hold on one key.
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
    slot: Arc<Slot>,
    observed: u64,
}

impl KeyGuard {
    /// Whether another holder completed a computation for this key while
    /// this guard was queued.
    pub fn completed_while_waiting(&self) -> bool {
        self.slot.generation.load(Ordering::Acquire) != self.observed
    }

    /// Record that a computation for this key completed under this guard.
    pub fn mark_completed(&self) {
        self.set_failure(None);
        self.slot.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Record that the computation under this guard failed. Requests already
    /// queued for the key see the failure instead of repeating the work.
    pub fn mark_failed(&self, failure: KeyFailure) {
        self.set_failure(Some(failure));
        self.slot.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// The failure left by the last holder, if it finished while this guard
    /// was queued and did not succeed.
    pub fn failed_while_waiting(&self) -> Option<KeyFailure> {
        if !self.completed_while_waiting() {
            return None;
        }
        self.slot
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_failure(&self, failure: Option<KeyFailure>) {
        *self
            .slot
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = failure;
    }
}
