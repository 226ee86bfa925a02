// tests/ratelimiter/error_tests.rs

#[cfg(test)]
mod tests {
    use crate::fixtures::limiters::{ALL_ALGORITHMS, SEC, limiter_with};
    use rate_limit::{Algorithm, RateLimitError};
    use std::time::Duration;

    #[test]
    fn cost_above_capacity_is_invalid_request() {
        for algorithm in ALL_ALGORITHMS {
            let (limiter, _) = limiter_with(5, Duration::from_secs(1), algorithm);

            // even on a fresh, full quota
            match limiter.check_n("client1", 6) {
                Err(RateLimitError::InvalidRequest { cost, capacity }) => {
                    assert_eq!((cost, capacity), (6, 5));
                }
                other => panic!("Expected InvalidRequest for {algorithm:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn zero_cost_is_invalid_request() {
        let (limiter, _) = limiter_with(5, Duration::from_secs(1), Algorithm::SlidingWindowLog);
        assert!(matches!(
            limiter.check_n("client1", 0),
            Err(RateLimitError::InvalidRequest { cost: 0, .. })
        ));
    }

    #[test]
    fn invalid_request_leaves_quota_untouched() {
        let (limiter, _) = limiter_with(2, Duration::from_secs(1), Algorithm::FixedWindow);
        limiter.check("client1").unwrap();
        assert!(limiter.check_n("client1", 3).is_err());

        let decision = limiter.check("client1").unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn denial_is_not_an_error() {
        let (limiter, _) = limiter_with(1, Duration::from_secs(1), Algorithm::LeakyBucket);
        limiter.check("client1").unwrap();

        let result = limiter.check("client1");
        assert!(result.is_ok());
        assert!(!result.unwrap().allowed);
    }

    #[test]
    fn clock_going_backwards_does_not_panic_or_refill() {
        for algorithm in ALL_ALGORITHMS {
            let (limiter, clock) = limiter_with(2, Duration::from_secs(1), algorithm);
            clock.set(100 * SEC);
            limiter.check_n("client1", 2).unwrap();

            clock.rewind(Duration::from_secs(50));
            let decision = limiter.check("client1").unwrap();
            assert!(!decision.allowed, "{algorithm:?}");
            assert!(decision.remaining <= 2);

            // time resumes from where the key last saw it
            clock.set(102 * SEC);
            assert!(limiter.check("client1").unwrap().allowed, "{algorithm:?}");
        }
    }

    #[test]
    fn error_display_formatting() {
        let (limiter, _) = limiter_with(3, Duration::from_secs(1), Algorithm::TokenBucket);

        match limiter.check_n("client1", 10) {
            Err(e) => {
                let error_string = e.to_string();
                assert!(error_string.contains("invalid request"));
                assert!(error_string.contains("capacity 3"));
            }
            Ok(_) => panic!("Expected error, got success"),
        }
    }
}
