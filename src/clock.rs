// src/clock.rs

// clock module definition and implementations

// dependencies
use std::time::{Duration, Instant};
use thiserror::Error;

/// Clock trait to abstract time retrieval and sleeping.
/// Implementors must be thread-safe (Send + Sync).
/// The `now` method returns the current time in nanoseconds as a u64 and must never run backward.
/// The `sleep` method suspends the calling thread; waiting limiters call it with the guard released.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<u64, ClockError>;

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock error type
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum ClockError {
    #[error("clock reading unavailable")]
    Unavailable,
}

/// MonotonicClock implementation using `std::time::Instant`.
/// Reports nanoseconds elapsed since the clock was created, so it is immune to wall-clock
/// adjustments. This is the default clock used by the SlidingLimiter.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
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
    fn now(&self) -> Result<u64, ClockError> {
        u64::try_from(self.origin.elapsed().as_nanos()).map_err(|_| ClockError::Unavailable)
    }
}
