// src/sliding_limiter.rs

// sliding-limiter: a sliding-window call limiter shared by concurrent callers.

// dependencies
use crate::adapters::{Admission, Limited};
use crate::clock::{Clock, MonotonicClock};
use crate::config::LimiterConfig;
use crate::errors::LimiterError;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Quota consumed before tracking began, counted as `count` calls stamped `stamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholders {
    stamp: u64,
    count: usize,
}

/// Timestamps of admitted calls, oldest first, plus the cached instant at which
/// the oldest one leaves the window. Placeholders sit in front of every entry.
#[derive(Debug, Default)]
struct CallLog {
    placeholders: Option<Placeholders>,
    entries: VecDeque<u64>,
    next_expiry: Option<u64>,
}

impl CallLog {
    // evict every entry that has left the window as of `now`
    fn cleanup(&mut self, now: u64, interval_nanos: u64) {
        if self.next_expiry.is_none() {
            self.next_expiry = self.expiry_of_oldest(interval_nanos);
        }
        while let Some(expiry) = self.next_expiry {
            if now < expiry {
                break;
            }
            // placeholders share one stamp, so they leave together
            if self.placeholders.take().is_none() {
                self.entries.pop_front();
            }
            self.next_expiry = self.expiry_of_oldest(interval_nanos);
        }
    }

    fn len(&self) -> usize {
        self.entries.len() + self.placeholders.map_or(0, |p| p.count)
    }

    fn oldest(&self) -> Option<u64> {
        self.placeholders
            .map(|p| p.stamp)
            .or_else(|| self.entries.front().copied())
    }

    fn expiry_of_oldest(&self, interval_nanos: u64) -> Option<u64> {
        self.oldest()
            .map(|oldest| oldest.saturating_add(interval_nanos))
    }

    // account for `count` more calls stamped with the oldest entry, or `now`
    fn pad_front(&mut self, count: usize, now: u64) {
        let stamp = self.oldest().unwrap_or(now);
        let existing = self.placeholders.map_or(0, |p| p.count);
        self.placeholders = Some(Placeholders {
            stamp,
            count: existing + count,
        });
    }
}

/// The main SlidingLimiter model.
/// C is the clock type, defaulting to MonotonicClock.
/// The call log sits behind a re-entrant guard, so a thread already holding it
/// (see [`SlidingLimiter::exclusive`]) may call back into the limiter.
#[derive(Debug)]
pub struct SlidingLimiter<C = MonotonicClock>
where
    C: Clock,
{
    call_limit: usize,
    interval: Duration,
    interval_nanos: u64,
    wait: bool,
    refresh_interval: Duration,
    call_log: ReentrantMutex<RefCell<CallLog>>,
    clock: C,
}

impl SlidingLimiter<MonotonicClock> {
    /// Create a limiter admitting `calls` per `interval` on the monotonic clock.
    pub fn new(calls: usize, interval: Duration, wait: bool) -> Result<Self, LimiterError> {
        Self::with_config(
            LimiterConfig::new(calls, interval).wait(wait),
            MonotonicClock::new(),
        )
    }
}

impl Default for SlidingLimiter<MonotonicClock> {
    fn default() -> Self {
        Self::from_config(LimiterConfig::default(), MonotonicClock::new())
    }
}

// methods for the SlidingLimiter type
impl<C> SlidingLimiter<C>
where
    C: Clock,
{
    // assumes `config` has already been validated
    fn from_config(config: LimiterConfig, clock: C) -> Self {
        let interval_nanos = u64::try_from(config.interval.as_nanos()).unwrap_or(u64::MAX);

        Self {
            call_limit: config.calls,
            interval: config.interval,
            interval_nanos,
            wait: config.wait,
            refresh_interval: config.refresh_interval,
            call_log: ReentrantMutex::new(RefCell::new(CallLog::default())),
            clock,
        }
    }

    /// Create a new limiter from a config object and a clock
    pub fn with_config(config: LimiterConfig, clock: C) -> Result<Self, LimiterError> {
        config.validate()?;
        Ok(Self::from_config(config, clock))
    }

    /// Maximum number of calls admitted per window
    pub fn calls(&self) -> usize {
        self.call_limit
    }

    /// Length of the sliding window
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether callers block until admitted instead of failing fast
    pub fn wait(&self) -> bool {
        self.wait
    }

    /// The configuration this limiter was built from
    pub fn config(&self) -> LimiterConfig {
        LimiterConfig::new(self.call_limit, self.interval)
            .wait(self.wait)
            .refresh_interval(self.refresh_interval)
    }

    /// Register a new call.
    ///
    /// In wait mode this blocks until a slot opens; otherwise a full window fails
    /// immediately with [`LimiterError::RateLimitReached`]. On `Ok` the slot is
    /// consumed and stays consumed for the whole interval.
    pub fn register_call(&self) -> Result<(), LimiterError> {
        self.register(None).map(|_| ())
    }

    /// Like [`register_call`](Self::register_call), but a waiting caller gives up
    /// with [`LimiterError::WaitTimedOut`] once `max_wait` has elapsed.
    pub fn register_call_timeout(&self, max_wait: Duration) -> Result<(), LimiterError> {
        self.register(Some(max_wait)).map(|_| ())
    }

    /// Make a single admission attempt and never sleep, whatever the wait mode.
    pub fn try_register_call(&self) -> Result<(), LimiterError> {
        self.attempt().map(|_| ())
    }

    /// Scoped acquisition: register a call and hand back a token for the block
    /// that performs it. Dropping the token does not refund the slot.
    pub fn acquire(&self) -> Result<Admission<'_, C>, LimiterError> {
        let admitted_at = self.register(None)?;
        Ok(Admission::new(self, admitted_at))
    }

    /// Register a call, then run `operation` and return its output untouched.
    ///
    /// Errors produced by `operation` stay inside `R`; they are never mapped
    /// onto [`LimiterError`] and do not refund the slot.
    pub fn call<R>(&self, operation: impl FnOnce() -> R) -> Result<R, LimiterError> {
        let _admission = self.acquire()?;
        Ok(operation())
    }

    /// Wrap `function` so every invocation registers a call first.
    pub fn wrap<F>(self: &Arc<Self>, function: F) -> Limited<F, C> {
        Limited::new(Arc::clone(self), function)
    }

    /// Number of calls admittable right now without waiting.
    pub fn remaining(&self) -> Result<usize, LimiterError> {
        let guard = self.call_log.lock();
        let now = self.clock.now()?;
        let mut log = guard.borrow_mut();
        log.cleanup(now, self.interval_nanos);
        Ok(self.call_limit.saturating_sub(log.len()))
    }

    /// Lower the remaining capacity to `remaining`, for quota that was consumed
    /// before this limiter started tracking it. Placeholder entries share the
    /// timestamp of the oldest logged call (or now, if the log is empty) and
    /// expire with it. Does nothing if `remaining` is not below the current value.
    pub fn set_remaining(&self, remaining: usize) -> Result<(), LimiterError> {
        let guard = self.call_log.lock();
        let now = self.clock.now()?;
        let mut log = guard.borrow_mut();
        log.cleanup(now, self.interval_nanos);

        let current = self.call_limit.saturating_sub(log.len());
        if remaining >= current {
            return Ok(());
        }
        log.pad_front(current - remaining, now);

        debug!(
            calls = self.call_limit,
            previous = current,
            remaining = remaining,
            "adjusted remaining call capacity"
        );
        Ok(())
    }

    /// Run `operation` while holding the limiter's guard, so that several limiter
    /// calls made from it observe one consistent window. Other threads block
    /// until it returns.
    ///
    /// A registering call made inside `operation` never sleeps: with the window
    /// full it fails with [`LimiterError::RateLimitReached`] even in wait mode.
    pub fn exclusive<R>(&self, operation: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.call_log.lock();
        operation(self)
    }

    // admission loop shared by every registering surface; returns the admission timestamp
    fn register(&self, max_wait: Option<Duration>) -> Result<u64, LimiterError> {
        let started = max_wait.map(|_| self.clock.now()).transpose()?;

        loop {
            match self.attempt() {
                Ok(admitted_at) => return Ok(admitted_at),
                Err(err) if self.wait && err.is_rate_limited() => {
                    // never sleep while this thread holds the guard
                    if self.call_log.is_owned_by_current_thread() {
                        debug!(
                            calls = self.call_limit,
                            interval = ?self.interval,
                            "call window full inside exclusive section, not waiting"
                        );
                        return Err(err);
                    }

                    let retry_after = err.retry_after().unwrap_or(Duration::ZERO);
                    let mut delay = retry_after.max(self.refresh_interval);

                    if let (Some(max_wait), Some(started)) = (max_wait, started) {
                        let waited = Duration::from_nanos(self.clock.now()?.saturating_sub(started));
                        if waited >= max_wait {
                            debug!(waited = ?waited, "gave up waiting for a call slot");
                            return Err(LimiterError::WaitTimedOut { waited });
                        }
                        delay = delay.min(max_wait - waited);
                    }

                    debug!(
                        calls = self.call_limit,
                        interval = ?self.interval,
                        delay = ?delay,
                        "call window full, waiting"
                    );
                    self.clock.sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    // cleanup, check and append under one acquisition of the guard
    fn attempt(&self) -> Result<u64, LimiterError> {
        let guard = self.call_log.lock();
        let now = self.clock.now()?;
        let mut log = guard.borrow_mut();
        log.cleanup(now, self.interval_nanos);

        if log.len() < self.call_limit {
            log.entries.push_back(now);
            trace!(
                admitted_at = now,
                in_window = log.len(),
                calls = self.call_limit,
                "call admitted"
            );
            return Ok(now);
        }

        let retry_after = log
            .next_expiry
            .map(|expiry| Duration::from_nanos(expiry.saturating_sub(now)))
            .unwrap_or(Duration::ZERO);

        if !self.wait {
            debug!(
                calls = self.call_limit,
                interval = ?self.interval,
                retry_after = ?retry_after,
                "call rejected, window full"
            );
        }

        Err(LimiterError::RateLimitReached {
            calls: self.call_limit,
            interval: self.interval,
            retry_after,
        })
    }
}

impl<C> fmt::Display for SlidingLimiter<C>
where
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SlidingLimiter(calls={}, interval={:?}, wait={})",
            self.call_limit, self.interval, self.wait
        )
    }
}
