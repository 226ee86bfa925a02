// src/clock.rs

// clock module definition and implementations

// dependencies
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Clock trait to abstract time retrieval.
///
/// `now` returns nanoseconds on a monotonic timeline private to the clock.
/// Readings never decrease for a well-behaved clock, but the limiter tolerates
/// one that does: elapsed time is clamped to zero.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Monotonic clock backed by `Instant`.
/// Reports nanoseconds elapsed since the clock was created.
/// This is the default clock used by `Limiter` and `Pacer`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock that reads zero now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        // u64 nanoseconds covers ~584 years of uptime
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the limiter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<AtomicU64>, // Store as nanos
}

impl ManualClock {
    /// A clock frozen at `start_nanos` until advanced or set.
    pub fn new(start_nanos: u64) -> Self {
        Self {
            time: Arc::new(AtomicU64::new(start_nanos)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = duration_to_nanos(by);
        self.time
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(nanos))
            })
            .ok();
    }

    /// Move the clock backwards. Only useful for exercising clock skew.
    pub fn rewind(&self, by: Duration) {
        let nanos = duration_to_nanos(by);
        self.time
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_sub(nanos))
            })
            .ok();
    }

    /// Jump to an absolute reading.
    pub fn set(&self, nanos: u64) {
        self.time.store(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.time.load(Ordering::SeqCst)
    }
}

pub(crate) fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
