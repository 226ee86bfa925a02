// src/algorithm.rs

//! Per-key bucket state and the limiting algorithms that drive it.
//!
//! Everything here is pure given `(state, policy, now, cost)`: no clock reads,
//! no locking. The key store supplies exclusive access; a shared external
//! store could do the same.
//!
//! Token and leaky bucket levels are kept in fixed point, where one permit is
//! `window_nanos` units. Refilling for `elapsed` nanoseconds then adds exactly
//! `elapsed * capacity` units, so fractional refill never drifts.

// dependencies
use crate::decision::Decision;
use crate::errors::{RateLimitError, Result};
use crate::policy::{Algorithm, Policy};
use std::collections::VecDeque;

/// Mutable quota state for a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketState {
    last_updated: u64,
    pub(crate) evicted: bool,
    kind: BucketKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BucketKind {
    FixedWindow {
        count: u64,
        window_start: u64,
    },
    SlidingWindowLog {
        // (admitted_at, cost), oldest first
        log: VecDeque<(u64, u64)>,
        used: u64,
    },
    SlidingWindowCounter {
        previous_count: u64,
        current_count: u64,
        window_start: u64,
    },
    TokenBucket {
        tokens: u128,
    },
    LeakyBucket {
        volume: u128,
    },
}

/// Reject costs that could never be admitted.
pub fn validate_cost(policy: &Policy, cost: u64) -> Result<()> {
    if cost == 0 || cost > policy.capacity() {
        return Err(RateLimitError::InvalidRequest {
            cost,
            capacity: policy.capacity(),
        });
    }
    Ok(())
}

/// Try to take `cost` permits from `state` at time `now`.
///
/// Window rollover, refill and drain are applied whether or not the request
/// is admitted. A clock reading older than the state's last update is
/// treated as no time having passed.
pub fn try_consume(
    state: &mut BucketState,
    policy: &Policy,
    now: u64,
    cost: u64,
) -> Result<Decision> {
    validate_cost(policy, cost)?;
    let now = state.advance(policy, now);

    let wait = state.wait_for(policy, now, cost);
    if wait == 0 {
        state.commit(now, cost, policy);
        Ok(Decision::allow(
            state.available(policy, now),
            state.reset_at(policy, now),
        ))
    } else {
        Ok(Decision::deny(
            state.available(policy, now),
            wait,
            state.reset_at(policy, now),
        ))
    }
}

/// Report whether a single permit would be granted at `now`, without taking it.
pub fn peek(state: &BucketState, policy: &Policy, now: u64) -> Decision {
    let mut probe = state.clone();
    let now = probe.advance(policy, now);
    let remaining = probe.available(policy, now);
    let reset_at = probe.reset_at(policy, now);

    match probe.wait_for(policy, now, 1) {
        0 => Decision::allow(remaining, reset_at),
        wait => Decision::deny(remaining, wait, reset_at),
    }
}

impl BucketState {
    /// Initial state for a key first seen at `now`: windows start empty at
    /// `now`, the token bucket starts full and the leaky bucket starts empty.
    pub fn new(policy: &Policy, now: u64) -> Self {
        let kind = match policy.algorithm() {
            Algorithm::FixedWindow => BucketKind::FixedWindow {
                count: 0,
                window_start: now,
            },
            Algorithm::SlidingWindowLog => BucketKind::SlidingWindowLog {
                log: VecDeque::new(),
                used: 0,
            },
            Algorithm::SlidingWindowCounter => BucketKind::SlidingWindowCounter {
                previous_count: 0,
                current_count: 0,
                window_start: now,
            },
            Algorithm::TokenBucket => BucketKind::TokenBucket {
                tokens: full_level(policy),
            },
            Algorithm::LeakyBucket => BucketKind::LeakyBucket { volume: 0 },
        };

        Self {
            last_updated: now,
            evicted: false,
            kind,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.kind {
            BucketKind::FixedWindow { .. } => Algorithm::FixedWindow,
            BucketKind::SlidingWindowLog { .. } => Algorithm::SlidingWindowLog,
            BucketKind::SlidingWindowCounter { .. } => Algorithm::SlidingWindowCounter,
            BucketKind::TokenBucket { .. } => Algorithm::TokenBucket,
            BucketKind::LeakyBucket { .. } => Algorithm::LeakyBucket,
        }
    }

    /// Latest clock reading this state has been brought up to.
    pub fn last_updated(&self) -> u64 {
        self.last_updated
    }

    /// Nanoseconds since the last update, zero if the clock went backwards.
    pub fn idle_for(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_updated)
    }

    /// Bring the state up to `now` and return the effective time used.
    fn advance(&mut self, policy: &Policy, now: u64) -> u64 {
        // a state built for another algorithm is useless, start over
        if self.algorithm() != policy.algorithm() {
            *self = BucketState::new(policy, now);
        }

        let now = now.max(self.last_updated);
        let elapsed = now - self.last_updated;
        let window = policy.window_nanos();
        let rate = u128::from(policy.capacity());

        match &mut self.kind {
            BucketKind::FixedWindow {
                count,
                window_start,
            } => {
                if now - *window_start >= window {
                    *count = 0;
                    *window_start = now;
                }
            }
            BucketKind::SlidingWindowLog { log, used } => {
                while let Some(&(admitted_at, cost)) = log.front() {
                    if now - admitted_at < window {
                        break;
                    }
                    log.pop_front();
                    *used -= cost;
                }
            }
            BucketKind::SlidingWindowCounter {
                previous_count,
                current_count,
                window_start,
            } => {
                let since_start = now - *window_start;
                if since_start >= window {
                    let periods = since_start / window;
                    *previous_count = if periods == 1 { *current_count } else { 0 };
                    *current_count = 0;
                    *window_start += periods * window;
                }
            }
            BucketKind::TokenBucket { tokens } => {
                let refill = u128::from(elapsed).saturating_mul(rate);
                *tokens = tokens.saturating_add(refill).min(full_level(policy));
            }
            BucketKind::LeakyBucket { volume } => {
                let drained = u128::from(elapsed).saturating_mul(rate);
                *volume = volume.saturating_sub(drained);
            }
        }

        self.last_updated = now;
        now
    }

    /// Nanoseconds until `cost` permits could be admitted; zero means now.
    fn wait_for(&self, policy: &Policy, now: u64, cost: u64) -> u64 {
        let capacity = policy.capacity();
        let window = policy.window_nanos();
        let rate = u128::from(capacity);

        match &self.kind {
            BucketKind::FixedWindow {
                count,
                window_start,
            } => {
                if count.saturating_add(cost) <= capacity {
                    0
                } else {
                    window_start.saturating_add(window).saturating_sub(now)
                }
            }
            BucketKind::SlidingWindowLog { log, used } => {
                if used.saturating_add(cost) <= capacity {
                    return 0;
                }
                let must_free = used.saturating_add(cost) - capacity;
                let mut freed = 0;
                for &(admitted_at, entry_cost) in log {
                    freed += entry_cost;
                    if freed >= must_free {
                        return admitted_at
                            .saturating_add(window)
                            .saturating_sub(now)
                            .max(1);
                    }
                }
                // cost <= capacity, so the full log always frees enough
                window
            }
            BucketKind::SlidingWindowCounter {
                previous_count,
                current_count,
                window_start,
            } => {
                let window_u = u128::from(window);
                let into = u128::from(now - window_start);
                let next = u128::from(current_count.saturating_add(cost)) * window_u;
                let weighted =
                    (u128::from(*previous_count) * (window_u - into)).saturating_add(next);
                let limit = rate * window_u;
                if weighted <= limit {
                    return 0;
                }

                // previous window weight decays by previous_count units per ns
                let excess = weighted - limit;
                let until_rollover = window_u - into;
                if *previous_count > 0 {
                    let wait = ceil_div(excess, u128::from(*previous_count));
                    if wait < until_rollover {
                        return clamp_u64(wait);
                    }
                }

                // after rollover the current count becomes the decaying one
                let after = if next <= limit || *current_count == 0 {
                    0
                } else {
                    ceil_div(next - limit, u128::from(*current_count))
                };
                clamp_u64(until_rollover + after)
            }
            BucketKind::TokenBucket { tokens } => {
                let needed = u128::from(cost) * u128::from(window);
                if *tokens >= needed {
                    0
                } else {
                    clamp_u64(ceil_div(needed - tokens, rate))
                }
            }
            BucketKind::LeakyBucket { volume } => {
                let incoming = u128::from(cost) * u128::from(window);
                let full = full_level(policy);
                let level = volume.saturating_add(incoming);
                if level <= full {
                    0
                } else {
                    clamp_u64(ceil_div(level - full, rate))
                }
            }
        }
    }

    fn commit(&mut self, now: u64, cost: u64, policy: &Policy) {
        let units = u128::from(cost) * u128::from(policy.window_nanos());

        match &mut self.kind {
            BucketKind::FixedWindow { count, .. } => *count += cost,
            BucketKind::SlidingWindowLog { log, used } => {
                let same_instant = log
                    .back()
                    .is_some_and(|&(admitted_at, _)| admitted_at == now);
                if let Some(last) = log.back_mut().filter(|_| same_instant) {
                    last.1 += cost;
                } else {
                    log.push_back((now, cost));
                }
                *used += cost;
            }
            BucketKind::SlidingWindowCounter { current_count, .. } => *current_count += cost,
            BucketKind::TokenBucket { tokens } => *tokens -= units,
            BucketKind::LeakyBucket { volume } => *volume += units,
        }
    }

    /// Whole permits available right now.
    fn available(&self, policy: &Policy, now: u64) -> u64 {
        let capacity = policy.capacity();
        let window = u128::from(policy.window_nanos());

        let remaining = match &self.kind {
            BucketKind::FixedWindow { count, .. } => capacity.saturating_sub(*count),
            BucketKind::SlidingWindowLog { used, .. } => capacity.saturating_sub(*used),
            BucketKind::SlidingWindowCounter {
                previous_count,
                current_count,
                window_start,
            } => {
                let into = u128::from(now - window_start);
                let weighted = (u128::from(*previous_count) * (window - into))
                    .saturating_add(u128::from(*current_count) * window);
                let free = (u128::from(capacity) * window).saturating_sub(weighted);
                clamp_u64(free / window)
            }
            BucketKind::TokenBucket { tokens } => clamp_u64(tokens / window),
            BucketKind::LeakyBucket { volume } => {
                clamp_u64(full_level(policy).saturating_sub(*volume) / window)
            }
        };

        remaining.min(capacity)
    }

    fn reset_at(&self, policy: &Policy, now: u64) -> u64 {
        let window = policy.window_nanos();
        let rate = u128::from(policy.capacity());

        match &self.kind {
            BucketKind::FixedWindow { window_start, .. }
            | BucketKind::SlidingWindowCounter { window_start, .. } => {
                window_start.saturating_add(window)
            }
            BucketKind::SlidingWindowLog { log, .. } => log
                .front()
                .map_or(now, |&(admitted_at, _)| admitted_at.saturating_add(window)),
            BucketKind::TokenBucket { tokens } => {
                let missing = full_level(policy).saturating_sub(*tokens);
                now.saturating_add(clamp_u64(ceil_div(missing, rate)))
            }
            BucketKind::LeakyBucket { volume } => {
                now.saturating_add(clamp_u64(ceil_div(*volume, rate)))
            }
        }
    }
}

fn full_level(policy: &Policy) -> u128 {
    u128::from(policy.capacity()) * u128::from(policy.window_nanos())
}

fn ceil_div(numerator: u128, denominator: u128) -> u128 {
    numerator.div_ceil(denominator)
}

fn clamp_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
