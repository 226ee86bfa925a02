// src/store.rs

//! Concurrent map from key to bucket state.
//!
//! Each entry sits behind its own mutex. The map's shard locks are only held
//! to find or insert an entry, so requests for different keys never wait on
//! each other's algorithm work.

// dependencies
use crate::algorithm::BucketState;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

type Slot = Arc<Mutex<BucketState>>;

/// Keyed bucket states with idle eviction.
#[derive(Debug)]
pub struct KeyStore<K>
where
    K: Hash + Eq + Clone,
{
    entries: DashMap<K, Slot>,
}

impl<K> KeyStore<K>
where
    K: Hash + Eq + Clone,
{
    /// An empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Run `f` with exclusive access to the state for `key`, creating it with
    /// `init` if the key is not tracked yet.
    ///
    /// If a sweep evicts the entry between lookup and locking, the call starts
    /// over on a fresh entry so the update is never applied to a detached state.
    pub fn with_entry<R>(
        &self,
        key: &K,
        init: impl Fn() -> BucketState,
        f: impl FnOnce(&mut BucketState) -> R,
    ) -> R {
        loop {
            let slot = self.slot(key, &init);
            let mut state = slot.lock();
            if state.evicted {
                continue;
            }
            return f(&mut state);
        }
    }

    /// Run `f` on the state for `key` if it is tracked.
    pub fn with_existing<R>(&self, key: &K, f: impl FnOnce(&BucketState) -> R) -> Option<R> {
        let slot = self.entries.get(key).map(|entry| Arc::clone(entry.value()))?;
        let state = slot.lock();
        if state.evicted {
            return None;
        }
        Some(f(&state))
    }

    fn slot(&self, key: &K, init: &impl Fn() -> BucketState) -> Slot {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(init())));
        Arc::clone(entry.value())
    }

    /// Remove entries that have been idle for at least `idle_nanos` at `now`.
    ///
    /// Entries currently locked by a caller are skipped, as are entries
    /// updated within the threshold. Returns the number removed.
    pub fn sweep(&self, now: u64, idle_nanos: u64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, slot| {
            let Some(mut state) = slot.try_lock() else {
                return true;
            };
            if state.idle_for(now) < idle_nanos {
                return true;
            }
            state.evicted = true;
            removed += 1;
            false
        });
        removed
    }

    /// Forget `key`, waiting for any in-flight update on it to finish.
    pub fn remove(&self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some((_, slot)) => {
                slot.lock().evicted = true;
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.entries.retain(|_, slot| {
            slot.lock().evicted = true;
            false
        });
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> Default for KeyStore<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
