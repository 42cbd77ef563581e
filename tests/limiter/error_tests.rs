// tests/limiter/error_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::limiter_at;
    use sliding_limiter::{ClockError, LimiterError};
    use std::time::Duration;

    #[test]
    fn clock_error_propagates_in_register_call() {
        let (limiter, clock) = limiter_at(0.0, 2, 10, false);

        // Make the clock fail on next call
        clock.fail_next_call();

        match limiter.register_call().unwrap_err() {
            LimiterError::Clock(ClockError::Unavailable) => {} // Expected
            other => panic!("Expected clock error, got: {:?}", other),
        }
    }

    #[test]
    fn clock_failure_leaves_window_untouched() {
        let (limiter, clock) = limiter_at(0.0, 2, 10, false);
        limiter.register_call().unwrap();

        clock.fail_next_call();
        assert!(limiter.register_call().is_err());

        // Clock should work again automatically
        assert_eq!(limiter.remaining().unwrap(), 1);
        limiter.register_call().unwrap();
    }

    #[test]
    fn clock_error_propagates_in_capacity_accessors() {
        let (limiter, clock) = limiter_at(0.0, 3, 10, false);

        clock.fail_next_call();
        assert!(matches!(limiter.remaining(), Err(LimiterError::Clock(_))));

        clock.fail_next_call();
        assert!(matches!(limiter.set_remaining(0), Err(LimiterError::Clock(_))));
        assert_eq!(limiter.remaining().unwrap(), 3);
    }

    #[test]
    fn clock_error_interrupts_waiting_caller() {
        let (limiter, clock) = limiter_at(0.0, 1, 10, true);
        limiter.register_call().unwrap();

        clock.fail_next_call();
        assert!(matches!(
            limiter.register_call(),
            Err(LimiterError::Clock(_))
        ));
    }

    #[test]
    fn rate_limit_message_names_policy() {
        let (limiter, _clock) = limiter_at(0.0, 15, 900, false);
        for _ in 0..15 {
            limiter.register_call().unwrap();
        }

        let err = limiter.register_call().unwrap_err();
        assert_eq!(err.to_string(), "can not make more than 15 calls in 900s");
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(900)));
    }

    #[test]
    fn other_errors_are_not_rate_limits() {
        let errors = [
            LimiterError::InvalidCalls,
            LimiterError::InvalidInterval,
            LimiterError::InvalidRefreshInterval,
            LimiterError::WaitTimedOut {
                waited: Duration::from_secs(1),
            },
            LimiterError::Clock(ClockError::Unavailable),
        ];
        for err in errors {
            assert!(!err.is_rate_limited());
            assert_eq!(err.retry_after(), None);
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn clock_error_display_mentions_clock() {
        let err = LimiterError::from(ClockError::Unavailable);
        assert!(err.to_string().to_lowercase().contains("clock"));
    }
}
