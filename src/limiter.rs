// src/limiter.rs

// rate-limit: keyed limiter tying a policy, a clock and the key store together.

// dependencies
use crate::algorithm::{self, BucketState};
use crate::clock::{Clock, MonotonicClock, duration_to_nanos};
use crate::config::PolicyConfig;
use crate::decision::Decision;
use crate::errors::Result;
use crate::policy::Policy;
use crate::store::KeyStore;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use tracing::{debug, trace};

/// The main Limiter model.
/// K is the type used to identify callers (e.g., String, u64, etc.).
/// C is the clock type, defaulting to MonotonicClock.
/// Limiters are independent: each owns its own key store.
#[derive(Debug)]
pub struct Limiter<K, C = MonotonicClock>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    policy: Policy,
    store: KeyStore<K>,
    clock: C,
}

// methods for the Limiter type
impl<K, C> Limiter<K, C>
where
    K: Hash + Eq + Clone + Debug,
    C: Clock,
{
    pub fn new(policy: Policy, clock: C) -> Self {
        Self {
            policy,
            store: KeyStore::new(),
            clock,
        }
    }

    // method to create a new limiter from a config object
    pub fn with_config(config: PolicyConfig, clock: C) -> Result<Self> {
        Ok(Self::new(config.build()?, clock))
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of keys currently holding state.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }

    pub fn is_tracked(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }

    /// Check a request of cost 1 for `key`.
    pub fn check(&self, key: K) -> Result<Decision> {
        self.check_n(key, 1)
    }

    /// Check a request costing `cost` permits for `key`.
    ///
    /// Fails with `InvalidRequest` when `cost` is zero or exceeds capacity; no
    /// state is created for the key in that case.
    pub fn check_n(&self, key: K, cost: u64) -> Result<Decision> {
        algorithm::validate_cost(&self.policy, cost)?;

        let decision = self.store.with_entry(
            &key,
            || {
                debug!(key = ?key, algorithm = ?self.policy.algorithm(), "tracking new key");
                BucketState::new(&self.policy, self.clock.now())
            },
            |state| algorithm::try_consume(state, &self.policy, self.clock.now(), cost),
        )?;

        trace!(
            key = ?key,
            cost,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "checked rate limit"
        );
        if !decision.allowed {
            debug!(
                key = ?key,
                cost,
                retry_after = ?decision.retry_after,
                "rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Standing of `key` for a single permit, without consuming anything.
    /// Returns `None` for keys that hold no state.
    pub fn peek(&self, key: &K) -> Option<Decision> {
        self.store.with_existing(key, |state| {
            algorithm::peek(state, &self.policy, self.clock.now())
        })
    }

    /// Forget all state for `key`.
    pub fn reset(&self, key: &K) -> bool {
        let removed = self.store.remove(key);
        if removed {
            debug!(key = ?key, "reset key");
        }
        removed
    }

    /// Remove keys idle for at least `idle_threshold`; returns how many were removed.
    /// Meant to be driven by an external scheduler.
    pub fn sweep(&self, idle_threshold: Duration) -> usize {
        let now = self.clock.now();
        let removed = self.store.sweep(now, duration_to_nanos(idle_threshold));
        debug!(
            removed,
            remaining = self.store.len(),
            idle_threshold = ?idle_threshold,
            "swept idle keys"
        );
        removed
    }

    /// Sweep with the policy's retention as the idle threshold.
    pub fn sweep_idle(&self) -> usize {
        self.sweep(self.policy.retention())
    }
}
