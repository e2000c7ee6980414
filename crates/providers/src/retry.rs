//! Exponential backoff for rate-limited provider calls.

use std::future::Future;
use std::time::Duration;

use neura_config::GeminiConfig;
use neura_core::ProviderError;
use tracing::warn;

/// Retry schedule: `initial_delay`, doubling per attempt, capped at
/// `max_delay`, for at most `max_retries` retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_retry_delay_ms),
            max_delay: Duration::from_millis(config.max_retry_delay_ms),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Run `op`, retrying only on `RateLimited`.
///
/// When retries are exhausted the error reports the total attempt count.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut retry = 0;
    loop {
        match op().await {
            Err(ProviderError::RateLimited { .. }) if retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                warn!(
                    operation,
                    attempt = retry + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(ProviderError::RateLimited { .. }) => {
                return Err(ProviderError::RateLimited {
                    attempts: retry + 1,
                });
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(64));
        assert_eq!(policy.delay_for(6), Duration::from_secs(120));
        assert_eq!(policy.delay_for(40), Duration::from_secs(120));
    }

    #[test]
    fn policy_from_config() {
        let policy = RetryPolicy::from_config(&GeminiConfig::default());
        assert_eq!(policy, RetryPolicy::default());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limits_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = with_retry(&RetryPolicy::default(), "embed", || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProviderError::RateLimited { attempts: 1 })
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
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), "embed", || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::RateLimited { attempts: 1 }) }
        })
        .await;
        assert!(matches!(
            result,
            Err(ProviderError::RateLimited { attempts: 6 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), "embed", || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::AuthenticationFailed("bad key".into())) }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
