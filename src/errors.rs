// src/errors.rs

// error handling for the rate limiter

// dependencies
use thiserror::Error;

/// Reasons a quota policy is rejected at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    #[error("window must be greater than zero")]
    ZeroWindow,
    #[error("window does not fit in 64-bit nanoseconds")]
    WindowTooLarge,
    #[error("retention must be at least one window")]
    ZeroRetention,
}

/// Error type for the rate limiter.
///
/// A denied request is not an error: it comes back as a `Decision` with
/// `allowed == false`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateLimitError {
    /// The policy parameters are out of range.
    #[error("invalid policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    /// The request cost is zero or larger than the bucket can ever hold.
    #[error("invalid request: cost {cost} must be between 1 and capacity {capacity}")]
    InvalidRequest { cost: u64, capacity: u64 },

    /// A pacer interval adjustment was negative or not a finite number.
    #[error("invalid interval adjustment: {0}")]
    InvalidAdjustment(f64),
}

/// Result type alias for rate limiter operations.
pub type Result<T> = std::result::Result<T, RateLimitError>;
