// src/errors.rs

// error handling for the sliding limiter type

// dependencies
use std::time::Duration;
use thiserror::Error;

use crate::clock::ClockError;

/// Error type for SlidingLimiter configuration and admission.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LimiterError {
    /// The window is full and the limiter is not allowed to wait.
    #[error("can not make more than {calls} calls in {interval:?}")]
    RateLimitReached {
        calls: usize,
        interval: Duration,
        /// Time until the oldest logged call leaves the window
        retry_after: Duration,
    },
    /// A bounded wait ran out before a slot opened.
    #[error("no call slot opened within {waited:?}")]
    WaitTimedOut { waited: Duration },
    #[error("call limit must be positive")]
    InvalidCalls,
    #[error("interval must be positive")]
    InvalidInterval,
    #[error("refresh interval must be positive")]
    InvalidRefreshInterval,
    #[error("clock error occurred: {0}")]
    Clock(#[from] ClockError),
}

impl LimiterError {
    /// True for the throttling signal, which callers should treat as an expected outcome.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LimiterError::RateLimitReached { .. })
    }

    /// Suggested delay before the next attempt, when the window was full.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LimiterError::RateLimitReached { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}
