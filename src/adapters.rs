// src/adapters.rs

//! Scoped and function-wrapping surfaces over [`SlidingLimiter::register_call`].

// dependencies
use crate::clock::{Clock, MonotonicClock};
use crate::errors::LimiterError;
use crate::sliding_limiter::SlidingLimiter;
use std::sync::Arc;

/// Proof that a call was admitted, held for the scope that performs it.
/// Dropping it does nothing: the slot stays consumed until it leaves the window.
#[must_use = "an admission is meant to cover the call that follows it"]
#[derive(Debug)]
pub struct Admission<'a, C = MonotonicClock>
where
    C: Clock,
{
    limiter: &'a SlidingLimiter<C>,
    admitted_at: u64,
}

impl<'a, C> Admission<'a, C>
where
    C: Clock,
{
    pub(crate) fn new(limiter: &'a SlidingLimiter<C>, admitted_at: u64) -> Self {
        Self {
            limiter,
            admitted_at,
        }
    }

    /// Clock reading (nanoseconds) at which the call was admitted
    pub fn admitted_at_nanos(&self) -> u64 {
        self.admitted_at
    }

    /// The limiter that admitted the call
    pub fn limiter(&self) -> &'a SlidingLimiter<C> {
        self.limiter
    }
}

/// A function whose every invocation is registered with a shared limiter first.
///
/// Arguments are passed as a single value; use a tuple for several.
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use sliding_limiter::SlidingLimiter;
///
/// let limiter = Arc::new(SlidingLimiter::new(2, Duration::from_secs(60), false).unwrap());
/// let add = limiter.wrap(|(a, b): (u32, u32)| a + b);
///
/// assert_eq!(add.call((1, 2)).unwrap(), 3);
/// assert_eq!(add.call((3, 4)).unwrap(), 7);
/// assert!(add.call((5, 6)).unwrap_err().is_rate_limited());
/// ```
pub struct Limited<F, C = MonotonicClock>
where
    C: Clock,
{
    limiter: Arc<SlidingLimiter<C>>,
    function: F,
}

impl<F, C> Limited<F, C>
where
    C: Clock,
{
    pub(crate) fn new(limiter: Arc<SlidingLimiter<C>>, function: F) -> Self {
        Self { limiter, function }
    }

    /// Register a call, then invoke the wrapped function with `args`.
    pub fn call<A, R>(&self, args: A) -> Result<R, LimiterError>
    where
        F: Fn(A) -> R,
    {
        self.limiter.register_call()?;
        Ok((self.function)(args))
    }

    /// Same as [`call`](Self::call) for functions that mutate captured state.
    pub fn call_mut<A, R>(&mut self, args: A) -> Result<R, LimiterError>
    where
        F: FnMut(A) -> R,
    {
        self.limiter.register_call()?;
        Ok((self.function)(args))
    }

    /// Type name of the wrapped function
    pub fn name(&self) -> &'static str {
        std::any::type_name::<F>()
    }

    /// The limiter every invocation registers with
    pub fn limiter(&self) -> &Arc<SlidingLimiter<C>> {
        &self.limiter
    }

    /// The wrapped function, callable without registering
    pub fn get_ref(&self) -> &F {
        &self.function
    }

    /// Unwrap the function, detaching it from the limiter
    pub fn into_inner(self) -> F {
        self.function
    }
}

impl<F, C> Clone for Limited<F, C>
where
    F: Clone,
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            function: self.function.clone(),
        }
    }
}

impl<F, C> std::fmt::Debug for Limited<F, C>
where
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Limited")
            .field("function", &self.name())
            .field("limiter", &format_args!("{}", self.limiter))
            .finish()
    }
}
