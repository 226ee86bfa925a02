// tests/ratelimiter/concurrency_tests.rs

#[cfg(test)]
mod tests {

    use crate::fixtures::limiters::{ALL_ALGORITHMS, limiter_with};
    use rate_limit::{Algorithm, Limiter, MonotonicClock, Policy};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;
    use std::time::Duration;

    // N threads, one request each, against a fresh bucket of capacity N
    #[test]
    fn contention_on_one_key_loses_no_updates() {
        const THREADS: u64 = 16;

        for algorithm in ALL_ALGORITHMS {
            let (limiter, _) = limiter_with(THREADS, Duration::from_secs(60), algorithm);
            let allowed = AtomicU64::new(0);
            let denied = AtomicU64::new(0);

            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        if limiter.check("shared").unwrap().allowed {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        } else {
                            denied.fetch_add(1, Ordering::Relaxed);
                        }
                    });
                }
            });

            assert_eq!(allowed.load(Ordering::Relaxed), THREADS, "{algorithm:?}");
            assert_eq!(denied.load(Ordering::Relaxed), 0, "{algorithm:?}");
            assert!(!limiter.check("shared").unwrap().allowed, "{algorithm:?}");
        }
    }

    #[test]
    fn oversubscribed_key_admits_exactly_capacity() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 50;
        const CAPACITY: u64 = 100;

        let (limiter, _) =
            limiter_with(CAPACITY, Duration::from_secs(60), Algorithm::SlidingWindowLog);
        let allowed = AtomicU64::new(0);

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        if limiter.check("shared").unwrap().allowed {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(allowed.load(Ordering::Relaxed), CAPACITY);
    }

    #[test]
    fn distinct_keys_proceed_in_parallel() {
        let policy = Policy::new(1, Duration::from_secs(60), Algorithm::TokenBucket).unwrap();
        let limiter: Limiter<u64, _> = Limiter::new(policy, MonotonicClock::new());

        thread::scope(|s| {
            for t in 0..8u64 {
                let limiter = &limiter;
                s.spawn(move || {
                    for i in 0..100 {
                        assert!(limiter.check(t * 1000 + i).unwrap().allowed);
                    }
                });
            }
        });

        assert_eq!(limiter.tracked_keys(), 800);
    }

    #[test]
    fn sweep_runs_alongside_checks() {
        let (limiter, _) = limiter_with(1_000_000, Duration::from_secs(1), Algorithm::FixedWindow);
        let allowed = AtomicU64::new(0);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        if limiter.check("busy").unwrap().allowed {
                            allowed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..200 {
                    // threshold above any idle time seen here: nothing may go
                    limiter.sweep(Duration::from_secs(10));
                }
            });
        });

        assert_eq!(allowed.load(Ordering::Relaxed), 4000);
        assert_eq!(limiter.peek(&"busy").unwrap().remaining, 1_000_000 - 4000);
    }
}
