// src/config.rs

//! Configuration types for the sliding limiter

// dependencies
use crate::errors::LimiterError;
use std::time::Duration;

/// Calls admitted per window unless configured otherwise
pub const DEFAULT_CALLS: usize = 15;
/// Window length unless configured otherwise
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Minimum sleep between admission attempts of a waiting caller
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for limiter behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    pub(crate) calls: usize,
    pub(crate) interval: Duration,
    pub(crate) wait: bool,
    pub(crate) refresh_interval: Duration,
}

impl LimiterConfig {
    /// Create a new waiting configuration admitting `calls` per `interval`
    pub fn new(calls: usize, interval: Duration) -> Self {
        Self {
            calls,
            interval,
            ..Self::default()
        }
    }

    /// Builder-style: set the call limit
    pub fn calls(mut self, calls: usize) -> Self {
        self.calls = calls;
        self
    }

    /// Builder-style: set the window length
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Builder-style: block until admitted (`true`) or fail fast (`false`)
    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// Builder-style: set the minimum poll granularity of waiting callers
    pub fn refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LimiterError> {
        if self.calls == 0 {
            return Err(LimiterError::InvalidCalls);
        }
        if self.interval.is_zero() {
            return Err(LimiterError::InvalidInterval);
        }
        if self.refresh_interval.is_zero() {
            return Err(LimiterError::InvalidRefreshInterval);
        }
        Ok(())
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            calls: DEFAULT_CALLS,
            interval: DEFAULT_INTERVAL,
            wait: true,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}
