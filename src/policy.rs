// src/policy.rs

//! Quota policy: which algorithm to run and with what limits.

// dependencies
use crate::clock::duration_to_nanos;
use crate::errors::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Idle entries are kept for this many windows unless configured otherwise.
pub const DEFAULT_RETENTION_WINDOWS: u32 = 3;

/// The limiting algorithm a policy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Counter that resets when a full window has passed since it started.
    FixedWindow,
    /// Exact log of every admitted request within the trailing window.
    SlidingWindowLog,
    /// Two adjacent fixed windows blended by their overlap with the trailing window.
    SlidingWindowCounter,
    /// Bucket that starts full and refills continuously.
    TokenBucket,
    /// Bucket that starts empty and drains continuously.
    LeakyBucket,
}

/// An immutable, validated quota: at most `capacity` permits per `window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    capacity: u64,
    window: Duration,
    window_nanos: u64,
    algorithm: Algorithm,
    retention_windows: u32,
}

impl Policy {
    /// Build a validated policy with the default retention of
    /// `DEFAULT_RETENTION_WINDOWS` windows.
    ///
    /// Fails with `InvalidPolicy` when `capacity` is zero (`ZeroCapacity`),
    /// when `window` is zero (`ZeroWindow`), or when `window` does not fit in
    /// `u64` nanoseconds (`WindowTooLarge`).
    pub fn new(capacity: u64, window: Duration, algorithm: Algorithm) -> Result<Self> {
        if capacity < 1 {
            return Err(PolicyError::ZeroCapacity.into());
        }
        if window.is_zero() {
            return Err(PolicyError::ZeroWindow.into());
        }
        if window.as_nanos() > u128::from(u64::MAX) {
            return Err(PolicyError::WindowTooLarge.into());
        }

        Ok(Self {
            capacity,
            window,
            window_nanos: duration_to_nanos(window),
            algorithm,
            retention_windows: DEFAULT_RETENTION_WINDOWS,
        })
    }

    /// Builder-style: keep idle keys for `windows` windows before `sweep_idle` drops them.
    pub fn with_retention_windows(mut self, windows: u32) -> Result<Self> {
        if windows == 0 {
            return Err(PolicyError::ZeroRetention.into());
        }
        self.retention_windows = windows;
        Ok(self)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn window_nanos(&self) -> u64 {
        self.window_nanos
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Default idle threshold for sweeping, a small multiple of the window.
    pub fn retention(&self) -> Duration {
        self.window.saturating_mul(self.retention_windows)
    }
}
