use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use tokio::task::JoinHandle;

use super::dedup::DedupStore;
use super::metrics::PipelineMetrics;
use crate::classifier::chain::{Classification, ClassifierChain};
use crate::classifier::types::EventKind;
use crate::fetch::fetcher::RateLimitedFetcher;
use crate::notify::dispatcher::NotificationDispatcher;
use crate::notify::types::DeliveryResult;
use crate::transaction::types::RawTransaction;

/// A signature handed over by the webhook or the poll loop, with the full
/// transaction when the source already had it.
#[derive(Debug, Clone)]
pub struct DiscoveredTransaction {
    pub signature: String,
    pub payload: Option<RawTransaction>,
}

impl DiscoveredTransaction {
    pub fn signature(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            payload: None,
        }
    }

    pub fn with_payload(signature: impl Into<String>, payload: RawTransaction) -> Self {
        Self {
            signature: signature.into(),
            payload: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Already claimed by an earlier run.
    Duplicate,
    /// Upstream never produced the transaction.
    FetchFailed,
    /// Failed on chain, or no classifier recognized it.
    Ignored,
    Suppressed { kind: EventKind, reason: String },
    Dispatched {
        kind: EventKind,
        results: HashMap<String, DeliveryResult>,
    },
}

/// dedup, fetch, classify, dispatch; one signature at a time per run.
pub struct TransactionPipeline {
    dedup: DedupStore,
    fetcher: RateLimitedFetcher,
    chain: ClassifierChain,
    dispatcher: NotificationDispatcher,
    metrics: PipelineMetrics,
}

impl TransactionPipeline {
    pub fn new(
        dedup: DedupStore,
        fetcher: RateLimitedFetcher,
        chain: ClassifierChain,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            dedup,
            fetcher,
            chain,
            dispatcher,
            metrics: PipelineMetrics::default(),
        }
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    pub fn fetcher(&self) -> &RateLimitedFetcher {
        &self.fetcher
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Run in the background; the caller does not wait for the outcome.
    pub fn submit(self: &Arc<Self>, discovered: DiscoveredTransaction) -> JoinHandle<PipelineOutcome> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.process(discovered).await })
    }

    pub async fn process(&self, discovered: DiscoveredTransaction) -> PipelineOutcome {
        let DiscoveredTransaction { signature, payload } = discovered;
        self.metrics.record_received();

        // Claimed for good from here on, whatever happens downstream.
        let is_new = self.dedup.mark_if_new(&signature);
        self.metrics.record_dedup(is_new);
        if !is_new {
            debug!("Skipping already seen {}", signature);
            return PipelineOutcome::Duplicate;
        }

        let mut tx = match payload {
            Some(tx) => tx,
            None => match self.fetcher.fetch(&signature).await {
                Some(tx) => tx,
                None => {
                    self.metrics.record_fetch_failure();
                    return PipelineOutcome::FetchFailed;
                }
            },
        };
        if tx.transaction.signatures.is_empty() {
            tx.transaction.signatures.push(signature.clone());
        }

        if !tx.is_success() {
            debug!("{} failed on chain, ignoring", signature);
            self.metrics.record_ignored();
            return PipelineOutcome::Ignored;
        }

        match self.chain.classify(&tx) {
            Classification::Unrecognized => {
                debug!("{} not recognized", signature);
                self.metrics.record_ignored();
                PipelineOutcome::Ignored
            }
            Classification::Suppressed { kind, reason } => {
                debug!("{} {} suppressed: {}", kind, signature, reason);
                self.metrics.record_suppressed();
                PipelineOutcome::Suppressed { kind, reason }
            }
            Classification::Event(event) => {
                let kind = event.kind();
                info!("{} classified as {}", signature, kind);
                self.metrics.record_event(kind);

                let results = self.dispatcher.dispatch(&event).await;
                for result in results.values() {
                    self.metrics.record_delivery(result.succeeded);
                }
                PipelineOutcome::Dispatched { kind, results }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::registry::ClassifierContext;
    use crate::fetch::client::MockTransactionSource;
    use crate::fetch::error::FetchError;
    use crate::fetch::fetcher::FetcherConfig;
    use crate::notify::channel::{MockNotificationChannel, NotificationChannel};
    use crate::notify::types::MessageFormat;
    use crate::retry::RetryConfig;
    use crate::transaction::types::fixtures::system_transfer;
    use serde_json::json;
    use tokio::time::Duration;

    fn native_transfer(signature: &str) -> RawTransaction {
        serde_json::from_value(json!({
            "blockTime": 1703001234,
            "meta": {
                "fee": 0,
                "preBalances": [5_000_000_000u64, 1_000_000_000u64],
                "postBalances": [4_000_000_000u64, 2_000_000_000u64]
            },
            "transaction": {
                "signatures": [signature],
                "message": {
                    "accountKeys": ["Sender", "Recipient"],
                    "instructions": [ system_transfer("Sender", "Recipient", 1_000_000_000) ]
                }
            }
        }))
        .unwrap()
    }

    fn pipeline(source: MockTransactionSource, channel: MockNotificationChannel) -> Arc<TransactionPipeline> {
        let fetcher = RateLimitedFetcher::new(
            Arc::new(source),
            FetcherConfig {
                min_interval: Duration::ZERO,
                retry: RetryConfig::linear(2, Duration::from_millis(1)),
                ..Default::default()
            },
        );
        let dispatcher = NotificationDispatcher::new(
            vec![Arc::new(channel) as Arc<dyn NotificationChannel>],
            RetryConfig::linear(2, Duration::from_millis(1)),
        );
        Arc::new(TransactionPipeline::new(
            DedupStore::new(100),
            fetcher,
            ClassifierChain::standard(ClassifierContext::with_defaults()),
            dispatcher,
        ))
    }

    fn channel(sends: usize) -> MockNotificationChannel {
        let mut channel = MockNotificationChannel::new();
        channel.expect_name().returning(|| "telegram".to_string());
        channel.expect_format().returning(|| MessageFormat::Html);
        channel.expect_send().times(sends).returning(|_| Ok(()));
        channel
    }

    #[tokio::test]
    async fn test_fetches_classifies_and_dispatches_once() {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .times(1)
            .returning(|sig| Ok(native_transfer(sig)));
        let pipeline = pipeline(source, channel(1));

        let outcome = pipeline.process(DiscoveredTransaction::signature("sigA")).await;
        match outcome {
            PipelineOutcome::Dispatched { kind, results } => {
                assert_eq!(kind, EventKind::Transfer);
                assert!(results["telegram"].succeeded);
            }
            other => panic!("expected dispatch, got {:?}", other),
        }

        let again = pipeline.process(DiscoveredTransaction::signature("sigA")).await;
        assert_eq!(again, PipelineOutcome::Duplicate);

        let metrics = pipeline.metrics().snapshot();
        assert_eq!(metrics.received, 2);
        assert_eq!(metrics.dedup_hits, 1);
        assert_eq!(metrics.transfers, 1);
        assert_eq!(metrics.deliveries_succeeded, 1);
    }

    #[tokio::test]
    async fn test_attached_payload_skips_fetch() {
        let mut source = MockTransactionSource::new();
        source.expect_get_transaction().never();
        let pipeline = pipeline(source, channel(1));

        let mut payload = native_transfer("ignored");
        payload.transaction.signatures.clear();
        let outcome = pipeline
            .submit(DiscoveredTransaction::with_payload("sigB", payload))
            .await
            .unwrap();
        assert!(matches!(outcome, PipelineOutcome::Dispatched { .. }));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_reclaimed() {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .times(2)
            .returning(|sig| Err(FetchError::NotFound(sig.to_string())));
        let pipeline = pipeline(source, channel(0));

        let outcome = pipeline.process(DiscoveredTransaction::signature("sigC")).await;
        assert_eq!(outcome, PipelineOutcome::FetchFailed);
        assert_eq!(
            pipeline.process(DiscoveredTransaction::signature("sigC")).await,
            PipelineOutcome::Duplicate
        );
        assert_eq!(pipeline.metrics().snapshot().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_failed_transaction_is_ignored() {
        let mut source = MockTransactionSource::new();
        source.expect_get_transaction().never();
        let pipeline = pipeline(source, channel(0));

        let mut payload = native_transfer("sigD");
        payload.meta.err = Some(json!({ "InstructionError": [0, "Custom"] }));
        let outcome = pipeline
            .process(DiscoveredTransaction::with_payload("sigD", payload))
            .await;
        assert_eq!(outcome, PipelineOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_dispatch_once() {
        let mut source = MockTransactionSource::new();
        source
            .expect_get_transaction()
            .times(1)
            .returning(|sig| Ok(native_transfer(sig)));
        let pipeline = pipeline(source, channel(1));

        let handles: Vec<_> = (0..5)
            .map(|_| pipeline.submit(DiscoveredTransaction::signature("sigE")))
            .collect();

        let mut dispatched = 0;
        for handle in handles {
            if let PipelineOutcome::Dispatched { .. } = handle.await.unwrap() {
                dispatched += 1;
            }
        }
        assert_eq!(dispatched, 1);
    }
}
