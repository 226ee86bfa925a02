// src/pacer.rs

//! Minimum-interval pacing.
//!
//! A `Pacer` spaces consecutive calls at least `interval` apart, sleeping the
//! calling thread (or task, with the `tokio` feature) when a call comes too
//! early. Callers sharing one pacer each reserve their own slot. The interval
//! can be tuned at runtime, e.g. backing off when an upstream starts
//! returning 429s.

// dependencies
use crate::clock::{Clock, MonotonicClock, duration_to_nanos};
use crate::errors::{RateLimitError, Result};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug)]
struct PacerState {
    interval_nanos: u64,
    last_called: Option<u64>,
    total_delay_nanos: u64,
    delayed_requests: u64,
}

/// Enforces a minimum interval between paced calls.
#[derive(Debug)]
pub struct Pacer<C = MonotonicClock>
where
    C: Clock,
{
    state: Mutex<PacerState>,
    clock: C,
}

impl<C> Pacer<C>
where
    C: Clock,
{
    /// A pacer that lets its first call through at once.
    pub fn new(interval: Duration, clock: C) -> Self {
        Self {
            state: Mutex::new(PacerState {
                interval_nanos: duration_to_nanos(interval),
                last_called: None,
                total_delay_nanos: 0,
                delayed_requests: 0,
            }),
            clock,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.state.lock().interval_nanos)
    }

    /// Sum of every wait handed out so far.
    pub fn total_delay(&self) -> Duration {
        Duration::from_nanos(self.state.lock().total_delay_nanos)
    }

    /// Number of calls that had to wait.
    pub fn delayed_requests(&self) -> u64 {
        self.state.lock().delayed_requests
    }

    /// Time left before the next call may go out; zero if it may go now.
    ///
    /// A nonzero answer is counted in the delay statistics. Nothing is
    /// reserved, so concurrent callers should use `reserve` instead.
    pub fn wait_time(&self) -> Duration {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let Some(last_called) = state.last_called else {
            return Duration::ZERO;
        };
        let since_last = now.saturating_sub(last_called);
        if since_last >= state.interval_nanos {
            return Duration::ZERO;
        }

        let wait = state.interval_nanos - since_last;
        state.record_delay(wait);
        Duration::from_nanos(wait)
    }

    /// Claim the next free slot and return how long to wait before using it.
    ///
    /// The slot is `max(now, last_called + interval)` and becomes the new
    /// `last_called`, so every caller gets its own slot one interval after
    /// the previous one.
    pub fn reserve(&self) -> Duration {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let slot = match state.last_called {
            Some(last_called) => now.max(last_called.saturating_add(state.interval_nanos)),
            None => now,
        };
        state.last_called = Some(slot);

        let wait = slot - now;
        if wait > 0 {
            state.record_delay(wait);
        }
        Duration::from_nanos(wait)
    }

    /// Record that a paced call just happened. A slot already reserved
    /// further ahead is kept.
    pub fn mark_called(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.last_called = Some(state.last_called.map_or(now, |last| last.max(now)));
    }

    /// Reserve a slot, sleep the thread until it comes up, then run `f`.
    pub fn pace<T>(&self, f: impl FnOnce() -> T) -> T {
        let wait = self.reserve();
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        f()
    }

    /// Async counterpart of `pace`: the task sleeps on the tokio timer
    /// until its slot, then `fut` is awaited.
    #[cfg(feature = "tokio")]
    pub async fn pace_async<F>(&self, fut: F) -> F::Output
    where
        F: std::future::Future,
    {
        let wait = self.reserve();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        fut.await
    }

    pub fn set_interval(&self, interval: Duration) {
        self.update_interval(|_| duration_to_nanos(interval));
    }

    pub fn increase_interval(&self, delta: Duration) {
        let delta = duration_to_nanos(delta);
        self.update_interval(|nanos| nanos.saturating_add(delta));
    }

    /// Shrink the interval by `delta`, stopping at zero.
    pub fn decrease_interval(&self, delta: Duration) {
        let delta = duration_to_nanos(delta);
        self.update_interval(|nanos| nanos.saturating_sub(delta));
    }

    /// Grow the interval by a fraction of itself, e.g. `0.25` for 25%.
    pub fn increase_interval_pct(&self, fraction: f64) -> Result<()> {
        let fraction = checked_fraction(fraction)?;
        self.update_interval(|nanos| scale(nanos, 1.0 + fraction));
        Ok(())
    }

    /// Shrink the interval by a fraction of itself; anything at or above
    /// `1.0` brings it to zero.
    pub fn decrease_interval_pct(&self, fraction: f64) -> Result<()> {
        let fraction = checked_fraction(fraction)?;
        self.update_interval(|nanos| scale(nanos, (1.0 - fraction).max(0.0)));
        Ok(())
    }

    // read and write under one lock so concurrent adjustments all land
    fn update_interval(&self, f: impl FnOnce(u64) -> u64) {
        let mut state = self.state.lock();
        state.interval_nanos = f(state.interval_nanos);
        debug!(interval_nanos = state.interval_nanos, "set pacing interval");
    }
}

impl PacerState {
    fn record_delay(&mut self, wait: u64) {
        self.total_delay_nanos = self.total_delay_nanos.saturating_add(wait);
        self.delayed_requests += 1;
        trace!(wait_nanos = wait, "issued pacing delay");
    }
}

fn scale(nanos: u64, factor: f64) -> u64 {
    // float to int casts saturate
    (nanos as f64 * factor).round() as u64
}

fn checked_fraction(fraction: f64) -> Result<f64> {
    if !fraction.is_finite() || fraction < 0.0 {
        return Err(RateLimitError::InvalidAdjustment(fraction));
    }
    Ok(fraction)
}
