// tests/limiter/concurrency_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::test_clock::TestClock;
    use sliding_limiter::{LimiterConfig, MonotonicClock, SlidingLimiter};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn waiting_callers_are_spaced_by_the_interval() {
        const CALLERS: usize = 4;
        let interval = Duration::from_millis(40);
        let config = LimiterConfig::new(1, interval).refresh_interval(Duration::from_millis(2));
        let limiter = Arc::new(SlidingLimiter::with_config(config, MonotonicClock::new()).unwrap());

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || limiter.acquire().unwrap().admitted_at_nanos())
            })
            .collect();

        let mut admitted: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        admitted.sort_unstable();

        assert_eq!(admitted.len(), CALLERS);
        for pair in admitted.windows(2) {
            assert!(
                pair[1] - pair[0] >= interval.as_nanos() as u64,
                "admissions {} and {} are closer than the interval",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn concurrent_non_waiting_callers_never_exceed_limit() {
        const THREADS: usize = 8;
        const ATTEMPTS: usize = 50;
        let clock = TestClock::new(0.0);
        let config = LimiterConfig::new(25, Duration::from_secs(60)).wait(false);
        let limiter = Arc::new(SlidingLimiter::with_config(config, clock).unwrap());
        let admitted = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                let rejected = Arc::clone(&rejected);
                thread::spawn(move || {
                    for _ in 0..ATTEMPTS {
                        match limiter.register_call() {
                            Ok(()) => admitted.fetch_add(1, Ordering::SeqCst),
                            Err(e) if e.is_rate_limited() => rejected.fetch_add(1, Ordering::SeqCst),
                            Err(e) => panic!("unexpected error: {e}"),
                        };
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 25);
        assert_eq!(rejected.load(Ordering::SeqCst), THREADS * ATTEMPTS - 25);
        assert_eq!(limiter.remaining().unwrap(), 0);
    }

    #[test]
    fn exclusive_section_sees_consistent_window() {
        const THREADS: usize = 6;
        let clock = TestClock::new(0.0);
        let config = LimiterConfig::new(3, Duration::from_secs(60)).wait(false);
        let limiter = Arc::new(SlidingLimiter::with_config(config, clock).unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    limiter.exclusive(|limiter| {
                        // check-then-register cannot be interleaved by other threads
                        if limiter.remaining().unwrap() > 0 {
                            limiter.try_register_call().unwrap();
                            true
                        } else {
                            false
                        }
                    })
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(admitted, 3);
    }

    #[test]
    fn sleeping_waiter_does_not_block_other_callers() {
        let interval = Duration::from_millis(400);
        let config = LimiterConfig::new(1, interval).refresh_interval(Duration::from_millis(5));
        let limiter = Arc::new(SlidingLimiter::with_config(config, MonotonicClock::new()).unwrap());
        limiter.register_call().unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || limiter.register_call())
        };
        thread::sleep(Duration::from_millis(30));

        let started = Instant::now();
        assert!(limiter.try_register_call().unwrap_err().is_rate_limited());
        assert_eq!(limiter.remaining().unwrap(), 0);
        assert!(
            started.elapsed() < interval / 2,
            "other callers were held for {:?}",
            started.elapsed()
        );

        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn exclusive_section_never_sleeps_holding_the_guard() {
        let interval = Duration::from_millis(400);
        let config = LimiterConfig::new(1, interval).refresh_interval(Duration::from_millis(5));
        let limiter = Arc::new(SlidingLimiter::with_config(config, MonotonicClock::new()).unwrap());
        limiter.register_call().unwrap();

        let holder = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || limiter.exclusive(|limiter| limiter.register_call()))
        };
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        assert!(limiter.try_register_call().unwrap_err().is_rate_limited());
        assert!(
            started.elapsed() < interval / 2,
            "fail-fast caller was held for {:?}",
            started.elapsed()
        );

        let inside = holder.join().unwrap();
        assert!(inside.unwrap_err().is_rate_limited());
    }
}
