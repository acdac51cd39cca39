use std::fmt::Display;
use std::future::Future;

use log::warn;
use tokio::time::Duration;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `initial_delay * n` before attempt `n + 1`.
    Linear,
    /// `initial_delay * factor^(n - 1)` before attempt `n + 1`.
    Exponential { factor: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Linear,
        }
    }
}

impl RetryConfig {
    pub fn linear(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: unit,
            ..Default::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            Backoff::Linear => self.initial_delay.saturating_mul(attempt),
            Backoff::Exponential { factor } => {
                let scaled = self.initial_delay.as_secs_f64() * factor.powi(attempt as i32 - 1);
                if scaled.is_finite() && scaled < self.max_delay.as_secs_f64() {
                    Duration::from_secs_f64(scaled.max(0.0))
                } else {
                    self.max_delay
                }
            }
        };
        delay.min(self.max_delay)
    }
}

/// Final result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. Sleeps between attempts; never sleeps after the last.
    pub async fn retry<F, Fut, T, E>(&self, label: &str, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                    }
                }
                Err(error) => {
                    if !error.is_retryable() || attempts >= max_attempts {
                        return RetryOutcome {
                            result: Err(error),
                            attempts,
                        };
                    }

                    let delay = self.config.delay_for(attempts);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        label, attempts, max_attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("flaky")]
        Flaky,
        #[error("fatal")]
        Fatal,
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Flaky)
        }
    }

    fn fast() -> RetryHandler {
        RetryHandler::new(RetryConfig::linear(3, Duration::from_millis(1)))
    }

    #[test]
    fn test_linear_delays() {
        let config = RetryConfig::linear(3, Duration::from_secs(1));
        assert_eq!(config.delay_for(1), Duration::from_secs(1));
        assert_eq!(config.delay_for(2), Duration::from_secs(2));
        assert_eq!(config.delay_for(100), Duration::from_secs(30));
    }

    #[test]
    fn test_exponential_delays() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff: Backoff::Exponential { factor: 2.0 },
        };
        assert_eq!(config.delay_for(1), Duration::from_millis(500));
        assert_eq!(config.delay_for(3), Duration::from_secs(2));
        assert_eq!(config.delay_for(10), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let outcome = fast()
            .retry("op", || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Flaky)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(outcome.result.unwrap(), 42);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let outcome: RetryOutcome<(), _> = fast().retry("op", || async { Err(TestError::Flaky) }).await;
        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let outcome: RetryOutcome<(), _> = fast().retry("op", || async { Err(TestError::Fatal) }).await;
        assert!(matches!(outcome.result, Err(TestError::Fatal)));
        assert_eq!(outcome.attempts, 1);
    }
}
