// src/config.rs

//! Configuration types for the rate limiter

// dependencies
use crate::errors::{PolicyError, Result};
use crate::policy::{Algorithm, DEFAULT_RETENTION_WINDOWS, Policy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializable description of a quota, turned into a `Policy` by `build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum permits per window
    pub capacity: u64,

    /// Window length in milliseconds
    pub window_ms: u64,

    /// Limiting algorithm
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,

    /// How many windows an idle key survives before `sweep_idle` removes it
    #[serde(default = "default_retention_windows")]
    pub retention_windows: u32,
}

fn default_algorithm() -> Algorithm {
    Algorithm::TokenBucket
}

fn default_retention_windows() -> u32 {
    DEFAULT_RETENTION_WINDOWS
}

impl PolicyConfig {
    /// Create a new configuration with capacity and window settings
    pub fn new(capacity: u64, window_ms: u64) -> Self {
        Self {
            capacity,
            window_ms,
            algorithm: default_algorithm(),
            retention_windows: default_retention_windows(),
        }
    }

    /// Builder-style: set capacity
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder-style: set window length in milliseconds
    pub fn window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Builder-style: set algorithm
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder-style: set retention multiple
    pub fn retention_windows(mut self, retention_windows: u32) -> Self {
        self.retention_windows = retention_windows;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 1 {
            return Err(PolicyError::ZeroCapacity.into());
        }
        if self.window_ms == 0 {
            return Err(PolicyError::ZeroWindow.into());
        }
        if self.retention_windows == 0 {
            return Err(PolicyError::ZeroRetention.into());
        }
        Ok(())
    }

    /// Validate and convert into an immutable policy
    pub fn build(&self) -> Result<Policy> {
        self.validate()?;
        Policy::new(
            self.capacity,
            Duration::from_millis(self.window_ms),
            self.algorithm,
        )?
        .with_retention_windows(self.retention_windows)
    }
}

impl TryFrom<PolicyConfig> for Policy {
    type Error = crate::errors::RateLimitError;

    fn try_from(config: PolicyConfig) -> Result<Self> {
        config.build()
    }
}
