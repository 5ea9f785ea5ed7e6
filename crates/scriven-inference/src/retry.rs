//! Bounded retry with exponential backoff and caller deadlines.
//!
//! Extraction and synthesis share this policy: retryable errors get a
//! bounded number of attempts with doubling delays; everything else
//! surfaces immediately. Deadlines wrap the whole operation, abandoning
//! the in-flight future on expiry.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use scriven_core::{defaults, Error, Result};

/// Retry policy: `max_attempts` tries with exponential backoff starting
/// at `base_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff delay after the given 1-based attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `op` until it succeeds, fails terminally, or attempts are
    /// exhausted. Only errors classified retryable are retried.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Run `fut` under a caller deadline. On expiry the future is dropped
/// and `on_timeout` supplies the error the caller sees.
pub async fn with_deadline<T, Fut>(
    deadline: Duration,
    fut: Fut,
    on_timeout: impl FnOnce() -> Error,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_retries_retryable_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();
        let calls2 = calls.clone();
        let result = policy
            .run(|_attempt| {
                let calls = calls2.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::Request("flaky".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_return_last_error() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
        };
        let result: Result<()> = policy
            .run(|_| async { Err(Error::Request("always down".into())) })
            .await;
        assert!(matches!(result, Err(Error::Request(_))));
    }

    #[tokio::test]
    async fn test_validation_errors_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();
        let calls2 = calls.clone();
        let result: Result<()> = policy
            .run(|_| {
                let calls = calls2.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::EmptyPrompt)
                }
            })
            .await;
        assert!(matches!(result, Err(Error::EmptyPrompt)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let result: Result<()> = with_deadline(
            Duration::from_millis(50),
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            },
            || Error::ExtractionTimeout("slow extractor".into()),
        )
        .await;
        assert!(matches!(result, Err(Error::ExtractionTimeout(_))));
    }

    #[tokio::test]
    async fn test_deadline_passes_through_success() {
        let result = with_deadline(Duration::from_secs(1), async { Ok(7) }, || {
            Error::Internal("unused".into())
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }
}
