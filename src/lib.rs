// src/lib.rs

//! # Rate Limit
//!
//! Keyed, in-process rate limiting. A `Limiter` tracks a quota per key and
//! answers "may this key proceed now?" with a `Decision` carrying the
//! remaining quota, a retry hint and the reset time.
//!
//! Five algorithms are available through `Algorithm`: fixed window, sliding
//! window log, sliding window counter, token bucket and leaky bucket.
//!
//! ## Quick Example
//!
//! ```rust
//! use rate_limit::{Algorithm, Limiter, MonotonicClock, Policy};
//! use std::time::Duration;
//!
//! let policy = Policy::new(10, Duration::from_secs(1), Algorithm::TokenBucket).unwrap();
//! let limiter = Limiter::new(policy, MonotonicClock::new());
//!
//! let decision = limiter.check("user_123").unwrap();
//! if decision.allowed {
//!     println!("Request allowed, {} left", decision.remaining);
//! } else {
//!     println!("Rate limited - retry after {:?}", decision.retry_after);
//! }
//! ```
//!
//! Idle keys are not dropped on their own; call `Limiter::sweep` or
//! `Limiter::sweep_idle` from whatever scheduler the application already runs.

// private modules
mod algorithm;
mod clock;
mod config;
mod decision;
mod errors;
mod limiter;
mod pacer;
mod policy;
mod store;

// public API exports
pub use algorithm::{BucketState, peek, try_consume, validate_cost};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::PolicyConfig;
pub use decision::Decision;
pub use errors::{PolicyError, RateLimitError, Result};
pub use limiter::Limiter;
pub use pacer::Pacer;
pub use policy::{Algorithm, DEFAULT_RETENTION_WINDOWS, Policy};
pub use store::KeyStore;
