//! Bounded retry with jittered exponential backoff.

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::debug;

/// Errors that may succeed when the same request is issued again.
pub trait Transient {
    /// Whether retrying could plausibly succeed.
    fn is_transient(&self) -> bool;
}

/// Retry policy for outbound calls.
///
/// Attempt `n` (zero based) waits a random duration in
/// `[0, min(max_delay, base_delay * 2^n)]` before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,

    /// Backoff base.
    pub base_delay: Duration,

    /// Backoff ceiling.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Upper bound of the wait after the given failed attempt.
    #[must_use]
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);

        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn jittered_backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);

        if ceiling.is_zero() {
            return ceiling;
        }

        let millis = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);

        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt + 1 < attempts => {
                    let delay = self.jittered_backoff(attempt);

                    debug!(
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient failure, retrying: {error}"
                    );

                    tokio::time::sleep(delay).await;

                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error)]
    enum FakeError {
        #[error("flaky")]
        Flaky,

        #[error("broken")]
        Broken,
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Flaky)
        }
    }

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = instant_policy(3)
            .run(move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FakeError::Flaky)
                } else {
                    Ok("done")
                }
            })
            .await;

        assert!(matches!(result, Ok("done")), "got {result:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = instant_policy(2)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Flaky)
            })
            .await;

        assert!(matches!(result, Err(FakeError::Flaky)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = instant_policy(5)
            .run(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Broken)
            })
            .await;

        assert!(matches!(result, Err(FakeError::Broken)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_ceiling_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };

        assert_eq!(policy.backoff_ceiling(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_ceiling(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_millis(350));
        assert_eq!(policy.backoff_ceiling(40), Duration::from_millis(350));
    }
}
