// tests/ratelimiter/fixtures/limiters.rs

// dependencies
use rate_limit::{Algorithm, Limiter, ManualClock, Policy};
use std::time::Duration;

pub const SEC: u64 = 1_000_000_000;

// Build a limiter keyed by &str on a manual clock starting at t=0
pub fn limiter_with(
    capacity: u64,
    window: Duration,
    algorithm: Algorithm,
) -> (Limiter<&'static str, ManualClock>, ManualClock) {
    let clock = ManualClock::new(0);
    let policy = Policy::new(capacity, window, algorithm).unwrap();
    (Limiter::new(policy, clock.clone()), clock)
}

pub const ALL_ALGORITHMS: [Algorithm; 5] = [
    Algorithm::FixedWindow,
    Algorithm::SlidingWindowLog,
    Algorithm::SlidingWindowCounter,
    Algorithm::TokenBucket,
    Algorithm::LeakyBucket,
];
