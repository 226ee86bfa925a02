// src/decision.rs

// dependencies
use std::time::Duration;

/// Result of a rate limiting decision with metadata for HTTP responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request should be allowed
    pub allowed: bool,
    /// Whole permits still available after this decision, never above capacity
    pub remaining: u64,
    /// How long until a request of the same cost could succeed (when denied)
    pub retry_after: Option<Duration>,
    /// When the quota resets, in nanoseconds on the limiter's clock
    pub reset_at: u64,
}

impl Decision {
    pub(crate) fn allow(remaining: u64, reset_at: u64) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: None,
            reset_at,
        }
    }

    pub(crate) fn deny(remaining: u64, retry_after_nanos: u64, reset_at: u64) -> Self {
        Self {
            allowed: false,
            remaining,
            retry_after: Some(Duration::from_nanos(retry_after_nanos)),
            reset_at,
        }
    }

    /// Retry-after rounded up to whole seconds, the form HTTP headers expect.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after.map(|d| {
            let secs = d.as_secs();
            if d.subsec_nanos() > 0 { secs + 1 } else { secs }
        })
    }
}
