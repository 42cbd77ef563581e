// src/registry.rs

//! One shared limiter per guarded resource.

// dependencies
use crate::clock::{Clock, MonotonicClock};
use crate::config::LimiterConfig;
use crate::errors::LimiterError;
use crate::sliding_limiter::SlidingLimiter;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Registry of limiters keyed by the resource they guard (an API host, an
/// endpoint class, ...). Components performing guarded calls fetch their
/// limiter here and hold on to the `Arc`.
/// We use `DashMap` for thread-safe concurrent access to the limiter map.
#[derive(Debug)]
pub struct LimiterRegistry<K, C = MonotonicClock>
where
    K: Hash + Eq,
    C: Clock + Clone,
{
    limiters: DashMap<K, Arc<SlidingLimiter<C>>>,
    clock: C,
}

impl<K> LimiterRegistry<K, MonotonicClock>
where
    K: Hash + Eq,
{
    /// Create a registry whose limiters read the monotonic clock
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl<K> Default for LimiterRegistry<K, MonotonicClock>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, C> LimiterRegistry<K, C>
where
    K: Hash + Eq,
    C: Clock + Clone,
{
    /// Create a registry whose limiters all read `clock`
    pub fn with_clock(clock: C) -> Self {
        Self {
            limiters: DashMap::new(),
            clock,
        }
    }

    /// Return the limiter guarding `key`, creating it from `config` on first use.
    /// `config` is ignored when the limiter already exists.
    pub fn limiter(
        &self,
        key: K,
        config: LimiterConfig,
    ) -> Result<Arc<SlidingLimiter<C>>, LimiterError> {
        let limiter = match self.limiters.entry(key) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let limiter = Arc::new(SlidingLimiter::with_config(config, self.clock.clone())?);
                debug!(limiter = %limiter, "registered limiter");
                entry.insert(Arc::clone(&limiter));
                limiter
            }
        };
        Ok(limiter)
    }

    /// The limiter guarding `key`, if one has been created
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<SlidingLimiter<C>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.limiters.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Forget the limiter for `key`; holders of its `Arc` keep using it.
    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<SlidingLimiter<C>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.limiters.remove(key).map(|(_, limiter)| limiter)
    }

    /// Number of guarded resources
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// True when the registry holds no limiters
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}
