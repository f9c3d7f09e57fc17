// src/services/rate_limiter.rs

//! Evasion delay, error classification and bounded retry.

use std::future::Future;
use std::time::Duration;

use crate::models::RateLimitConfig;
use crate::services::provider::ProviderError;

/// How a failed provider call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Transient,
    Fatal,
}

/// Result of a call driven through [`RateLimiter::call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    Done(T),
    /// Still rate limited after every retry; the caller decides what to abort.
    RateLimitExhausted,
    Failed(ProviderError),
}

/// Randomized pre-call delay and linear backoff under rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    retry_delay: Duration,
    max_retries: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.min_delay_ms)),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_retries: config.max_retries,
        }
    }

    pub fn classify(error: &ProviderError) -> ErrorClass {
        match error {
            ProviderError::RateLimited { .. } => ErrorClass::RateLimited,
            ProviderError::Timeout | ProviderError::Transient(_) => ErrorClass::Transient,
            ProviderError::Unauthorized(_) | ProviderError::Fatal(_) => ErrorClass::Fatal,
        }
    }

    /// Wait before retry `attempt` (zero-based): `retry_delay * (attempt + 1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Draw an evasion delay inside `[min, max]`.
    pub fn jitter(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(fastrand::u64(min..=max))
    }

    /// Block the caller for a randomized evasion delay.
    pub async fn delay(&self) {
        let wait = self.jitter();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Run one provider call under the retry policy.
    ///
    /// Every attempt is preceded by the evasion delay. Rate limiting is
    /// retried up to `max_retries` times with linear backoff; a transient
    /// failure is retried once without backoff; anything else fails at once.
    pub async fn call<T, F, Fut>(&self, context: &str, mut op: F) -> CallOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        let mut transient_retried = false;

        loop {
            self.delay().await;

            let error = match op().await {
                Ok(value) => return CallOutcome::Done(value),
                Err(error) => error,
            };

            match Self::classify(&error) {
                ErrorClass::RateLimited if attempt < self.max_retries => {
                    let wait = self.backoff(attempt);
                    attempt += 1;
                    log::warn!(
                        "{}: {} (retry {}/{} in {:?})",
                        context,
                        error,
                        attempt,
                        self.max_retries,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
                ErrorClass::RateLimited => {
                    log::warn!(
                        "{}: rate limit retries exhausted after {} attempts",
                        context,
                        attempt + 1
                    );
                    return CallOutcome::RateLimitExhausted;
                }
                ErrorClass::Transient if !transient_retried => {
                    transient_retried = true;
                    log::debug!("{}: {} (retrying once)", context, error);
                }
                ErrorClass::Transient | ErrorClass::Fatal => {
                    return CallOutcome::Failed(error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn limiter(retry_delay_ms: u64, max_retries: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            retry_delay_ms,
            max_retries,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_backoff_is_linear() {
        let limiter = limiter(1_000, 3);
        assert_eq!(limiter.backoff(0), Duration::from_secs(1));
        assert_eq!(limiter.backoff(1), Duration::from_secs(2));
        assert_eq!(limiter.backoff(2), Duration::from_secs(3));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            min_delay_ms: 100,
            max_delay_ms: 200,
            ..RateLimitConfig::default()
        });
        for _ in 0..100 {
            let d = limiter.jitter();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(200));
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            RateLimiter::classify(&ProviderError::RateLimited { status: 429 }),
            ErrorClass::RateLimited
        );
        assert_eq!(
            RateLimiter::classify(&ProviderError::Timeout),
            ErrorClass::Transient
        );
        assert_eq!(
            RateLimiter::classify(&ProviderError::Unauthorized("401".into())),
            ErrorClass::Fatal
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_retries_with_linear_backoff() {
        let limiter = limiter(1_000, 3);
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome: CallOutcome<()> = limiter
            .call("search offset 0", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::RateLimited { status: 429 })
            })
            .await;

        assert_eq!(outcome, CallOutcome::RateLimitExhausted);
        // One initial attempt plus exactly `max_retries` retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1s + 2s + 3s of backoff.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_millis(6_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_rate_limit() {
        let limiter = limiter(500, 3);
        let calls = AtomicU32::new(0);

        let outcome = limiter
            .call("detail 1", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::RateLimited { status: 429 })
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(outcome, CallOutcome::Done(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retried_once_without_backoff() {
        let limiter = limiter(1_000, 3);
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome: CallOutcome<()> = limiter
            .call("detail 1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::Timeout)
            })
            .await;

        assert_eq!(outcome, CallOutcome::Failed(ProviderError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_not_retried() {
        let limiter = limiter(1_000, 3);
        let calls = AtomicU32::new(0);

        let outcome: CallOutcome<()> = limiter
            .call("detail 1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::Fatal("HTTP 404".into()))
            })
            .await;

        assert!(matches!(outcome, CallOutcome::Failed(ProviderError::Fatal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
