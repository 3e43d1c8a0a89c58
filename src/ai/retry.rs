//! Retry policy for generative API calls.
//!
//! Only rate-limit responses are retried. The policy is injected into the
//! clients so tests can exercise the exhaustion path without real delays.

use crate::ai::types::{map_status_message, AiError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

#[async_trait]
pub trait RetryPolicy: Send + Sync {
    /// Total number of attempts, including the first one.
    fn max_attempts(&self) -> u32;

    /// Whether the given HTTP status warrants another attempt.
    fn should_retry(&self, status: u16) -> bool;

    /// Sleep before retry number `attempt` (0-based index of the failed attempt).
    async fn wait(&self, attempt: u32);
}

/// Linear backoff: wait (attempt + 1) x unit, retrying 429 only.
pub struct LinearBackoff {
    pub max_attempts: u32,
    pub unit: Duration,
}

impl LinearBackoff {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.unit * (attempt + 1)
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        LinearBackoff {
            max_attempts: 5,
            unit: Duration::from_secs(15),
        }
    }
}

#[async_trait]
impl RetryPolicy for LinearBackoff {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn should_retry(&self, status: u16) -> bool {
        status == 429
    }

    async fn wait(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        log::warn!(
            "[retry] Rate limited. Retrying in {}s (attempt {}/{})",
            delay.as_secs(),
            attempt + 1,
            self.max_attempts
        );
        tokio::time::sleep(delay).await;
    }
}

/// Run `op` under the given retry policy.
///
/// Non-retryable errors propagate after a single attempt. Exhausting the
/// attempt budget on retryable errors yields the distinct rate-limit error.
pub async fn with_retry<T, F, Fut>(policy: &dyn RetryPolicy, mut op: F) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiError>>,
{
    let max = policy.max_attempts().max(1);
    for attempt in 0..max {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retryable = err
                    .status_code
                    .map(|s| policy.should_retry(s))
                    .unwrap_or(false);
                if !retryable {
                    return Err(err);
                }
                if attempt + 1 < max {
                    policy.wait(attempt).await;
                }
            }
        }
    }
    Err(AiError::with_status(map_status_message(429), 429))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Test policy that records waits instead of sleeping.
    struct NoDelay {
        max_attempts: u32,
        waits: Arc<AtomicU32>,
    }

    #[async_trait]
    impl RetryPolicy for NoDelay {
        fn max_attempts(&self) -> u32 {
            self.max_attempts
        }

        fn should_retry(&self, status: u16) -> bool {
            status == 429
        }

        async fn wait(&self, _attempt: u32) {
            self.waits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_linear_backoff_strictly_increasing() {
        let policy = LinearBackoff::default();
        let delays: Vec<_> = (0..4).map(|a| policy.delay_for(a)).collect();
        assert_eq!(delays[0], Duration::from_secs(15));
        assert_eq!(delays[3], Duration::from_secs(60));
        for pair in delays.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[tokio::test]
    async fn test_exhaustion_performs_exact_attempt_count() {
        let waits = Arc::new(AtomicU32::new(0));
        let policy = NoDelay {
            max_attempts: 5,
            waits: waits.clone(),
        };
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result: Result<(), AiError> = with_retry(&policy, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AiError::with_status("too many requests", 429))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.message, "Rate limit exceeded. Wait before retrying.");
        assert_eq!(err.status_code, Some(429));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        // One wait between each pair of attempts, none after the last.
        assert_eq!(waits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_propagates_once() {
        let policy = NoDelay {
            max_attempts: 5,
            waits: Arc::new(AtomicU32::new(0)),
        };
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result: Result<(), AiError> = with_retry(&policy, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AiError::with_status("Authentication failed. Check your API key.", 401))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().status_code, Some(401));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let policy = NoDelay {
            max_attempts: 5,
            waits: Arc::new(AtomicU32::new(0)),
        };
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result = with_retry(&policy, move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AiError::with_status("too many requests", 429))
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
