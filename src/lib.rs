// src/lib.rs

//! # Sliding Limiter
//!
//! A thread-safe limiter admitting at most `calls` calls in any trailing `interval`,
//! shared by every caller of one guarded resource (typically a remote API).
//!
//! The same window can be used three ways: registering calls by hand, acquiring
//! an admission for a scoped block, or wrapping a function.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::time::Duration;
//! use sliding_limiter::{LimiterConfig, MonotonicClock, SlidingLimiter};
//!
//! let config = LimiterConfig::new(2, Duration::from_secs(60)).wait(false);
//! let limiter = SlidingLimiter::with_config(config, MonotonicClock::new()).unwrap();
//!
//! limiter.register_call().unwrap();
//! let body = limiter.call(|| "response body").unwrap();
//! assert_eq!(body, "response body");
//!
//! match limiter.register_call() {
//!     Err(e) if e.is_rate_limited() => println!("throttled: {e}"),
//!     other => panic!("expected throttling, got {other:?}"),
//! }
//! ```

// private modules
mod adapters;
mod clock;
mod config;
mod errors;
mod registry;
mod sliding_limiter;

// public API exports
pub use adapters::{Admission, Limited};
pub use clock::{Clock, ClockError, MonotonicClock};
pub use config::{DEFAULT_CALLS, DEFAULT_INTERVAL, DEFAULT_REFRESH_INTERVAL, LimiterConfig};
pub use errors::LimiterError;
pub use registry::LimiterRegistry;
pub use sliding_limiter::SlidingLimiter;
