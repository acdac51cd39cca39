use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::Semaphore;
use tokio::time::Duration;

use super::cache::TransactionCache;
use super::client::TransactionSource;
use super::error::FetchError;
use super::throttle::RequestThrottle;
use crate::retry::{RetryConfig, RetryHandler};
use crate::transaction::types::RawTransaction;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub concurrency: usize,
    pub min_interval: Duration,
    pub retry: RetryConfig,
    /// `None` disables the cache.
    pub cache_ttl: Option<Duration>,
    pub cache_capacity: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            min_interval: Duration::from_millis(120),
            retry: RetryConfig::default(),
            cache_ttl: Some(Duration::from_secs(3600)),
            cache_capacity: 1000,
        }
    }
}

/// Transaction lookups behind an in-flight cap, a request spacing throttle
/// and a bounded retry budget.
pub struct RateLimitedFetcher {
    source: Arc<dyn TransactionSource>,
    permits: Semaphore,
    throttle: Arc<RequestThrottle>,
    retry: RetryHandler,
    cache: Option<TransactionCache>,
}

impl RateLimitedFetcher {
    pub fn new(source: Arc<dyn TransactionSource>, config: FetcherConfig) -> Self {
        let throttle = Arc::new(RequestThrottle::new(config.min_interval));
        Self::with_throttle(source, config, throttle)
    }

    /// Share `throttle` with other callers of the same upstream.
    pub fn with_throttle(
        source: Arc<dyn TransactionSource>,
        config: FetcherConfig,
        throttle: Arc<RequestThrottle>,
    ) -> Self {
        Self {
            source,
            permits: Semaphore::new(config.concurrency.max(1)),
            throttle,
            retry: RetryHandler::new(config.retry),
            cache: config
                .cache_ttl
                .map(|ttl| TransactionCache::new(config.cache_capacity, ttl)),
        }
    }

    pub fn throttle(&self) -> Arc<RequestThrottle> {
        Arc::clone(&self.throttle)
    }

    /// Fetch one transaction. `None` once the retry budget is spent or the
    /// failure is permanent; the caller skips the transaction.
    pub async fn fetch(&self, signature: &str) -> Option<RawTransaction> {
        if let Some(cache) = &self.cache {
            if let Some(tx) = cache.get(signature).await {
                debug!("Cache hit for {}", signature);
                return Some(tx);
            }
        }

        let label = format!("Fetch {}", signature);
        let outcome = self.retry.retry(&label, || self.attempt(signature)).await;

        match outcome.result {
            Ok(tx) => {
                if let Some(cache) = &self.cache {
                    cache.insert(signature, tx.clone()).await;
                }
                Some(tx)
            }
            Err(e) => {
                warn!(
                    "Skipping {} after {} attempt(s): {}",
                    signature, outcome.attempts, e
                );
                None
            }
        }
    }

    // The permit covers the request only, not the backoff sleep.
    async fn attempt(&self, signature: &str) -> Result<RawTransaction, FetchError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FetchError::Rpc("fetcher is shut down".to_string()))?;
        self.throttle.wait().await;
        self.source.get_transaction(signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::client::MockTransactionSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config() -> FetcherConfig {
        FetcherConfig {
            concurrency: 2,
            min_interval: Duration::ZERO,
            retry: RetryConfig::linear(3, Duration::from_millis(1)),
            cache_ttl: Some(Duration::from_secs(60)),
            cache_capacity: 16,
        }
    }

    fn signed(signature: &str) -> RawTransaction {
        serde_json::from_value(serde_json::json!({ "transaction": { "signatures": [signature] } }))
            .unwrap()
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut source = MockTransactionSource::new();
        source.expect_get_transaction().times(3).returning(move |sig| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FetchError::NotFound(sig.to_string()))
            } else {
                Ok(signed(sig))
            }
        });

        let fetcher = RateLimitedFetcher::new(Arc::new(source), fast_config());
        let tx = fetcher.fetch("abc").await.unwrap();
        assert_eq!(tx.signature(), Some("abc"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_none() {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .times(3)
            .returning(|_| Err(FetchError::Network("connection reset".to_string())));

        let fetcher = RateLimitedFetcher::new(Arc::new(source), fast_config());
        assert!(fetcher.fetch("abc").await.is_none());
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .times(1)
            .returning(|_| Err(FetchError::Decode("unexpected shape".to_string())));

        let fetcher = RateLimitedFetcher::new(Arc::new(source), fast_config());
        assert!(fetcher.fetch("abc").await.is_none());
    }

    #[tokio::test]
    async fn test_cached_fetch_skips_upstream() {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .times(1)
            .returning(|sig| Ok(signed(sig)));

        let fetcher = RateLimitedFetcher::new(Arc::new(source), fast_config());
        assert!(fetcher.fetch("abc").await.is_some());
        assert!(fetcher.fetch("abc").await.is_some());
    }

    struct SlowSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TransactionSource for SlowSource {
        async fn get_transaction(&self, signature: &str) -> Result<RawTransaction, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(signed(signature))
        }
    }

    #[tokio::test]
    async fn test_concurrency_cap() {
        let source = Arc::new(SlowSource {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let fetcher = Arc::new(RateLimitedFetcher::new(source.clone(), fast_config()));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let fetcher = fetcher.clone();
                tokio::spawn(async move { fetcher.fetch(&format!("sig{}", i)).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        assert_eq!(source.peak.load(Ordering::SeqCst), 2);
    }
}
