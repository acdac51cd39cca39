use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::pipeline::{DiscoveredTransaction, TransactionPipeline};
use crate::fetch::client::SignatureFeed;
use crate::fetch::throttle::RequestThrottle;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub addresses: Vec<String>,
    pub interval: Duration,
    pub signature_limit: usize,
}

/// Periodically asks upstream for new signatures on every watched address
/// and hands them to the pipeline, oldest first.
pub struct AddressPoller {
    feed: Arc<dyn SignatureFeed>,
    pipeline: Arc<TransactionPipeline>,
    throttle: Arc<RequestThrottle>,
    config: PollerConfig,
    // Newest signature already handed over, per address
    cursors: HashMap<String, String>,
}

impl AddressPoller {
    pub fn new(
        feed: Arc<dyn SignatureFeed>,
        pipeline: Arc<TransactionPipeline>,
        throttle: Arc<RequestThrottle>,
        config: PollerConfig,
    ) -> Self {
        Self {
            feed,
            pipeline,
            throttle,
            config,
            cursors: HashMap::new(),
        }
    }

    pub fn cursor(&self, address: &str) -> Option<&str> {
        self.cursors.get(address).map(String::as_str)
    }

    /// One pass over every address. Returns the number of signatures submitted.
    pub async fn poll_once(&mut self) -> usize {
        let mut submitted = 0;

        for address in &self.config.addresses {
            self.throttle.wait().await;
            let until = self.cursors.get(address).cloned();

            let signatures = match self
                .feed
                .recent_signatures(address, until, self.config.signature_limit)
                .await
            {
                Ok(signatures) => signatures,
                Err(e) => {
                    warn!("Polling {} failed: {}", address, e);
                    continue;
                }
            };

            let previous = self.cursors.get(address);
            // The feed stops before the cursor, but not every upstream honours it.
            let fresh: Vec<&String> = signatures
                .iter()
                .take_while(|sig| Some(*sig) != previous)
                .collect();
            if fresh.is_empty() {
                continue;
            }
            debug!("{} new signature(s) for {}", fresh.len(), address);

            for signature in fresh.iter().rev() {
                // Outcomes are logged by the pipeline itself
                let _ = self
                    .pipeline
                    .submit(DiscoveredTransaction::signature(signature.as_str()));
                submitted += 1;
            }

            if let Some(newest) = signatures.first() {
                self.cursors.insert(address.clone(), newest.clone());
            }
        }

        submitted
    }

    pub async fn run(mut self) {
        info!(
            "Polling {} address(es) every {:?}",
            self.config.addresses.len(),
            self.config.interval
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }
}
