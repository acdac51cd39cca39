use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use log::{error, info, warn};

use super::channel::NotificationChannel;
use super::format::render;
use super::types::DeliveryResult;
use crate::classifier::types::StructuredEvent;
use crate::retry::{RetryConfig, RetryHandler};

/// Fans one event out to every configured channel. Each channel renders its
/// own message and spends its own retry budget; failures come back as data.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    retry: RetryHandler,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>, retry: RetryConfig) -> Self {
        Self {
            channels,
            retry: RetryHandler::new(retry),
        }
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    pub async fn dispatch(&self, event: &StructuredEvent) -> HashMap<String, DeliveryResult> {
        if self.channels.is_empty() {
            warn!("No notification channels configured, dropping {}", event.signature);
            return HashMap::new();
        }

        let deliveries = self
            .channels
            .iter()
            .map(|channel| self.deliver(channel.as_ref(), event));
        let results = join_all(deliveries).await;

        let succeeded = results.iter().filter(|r| r.succeeded).count();
        info!(
            "{} {} sent to {}/{} channels",
            event.kind(),
            event.signature,
            succeeded,
            results.len()
        );

        results
            .into_iter()
            .map(|result| (result.channel.clone(), result))
            .collect()
    }

    async fn deliver(
        &self,
        channel: &dyn NotificationChannel,
        event: &StructuredEvent,
    ) -> DeliveryResult {
        let name = channel.name();
        let message = render(event, channel.format());
        let label = format!("Send {} to {}", event.signature, name);

        let outcome = self.retry.retry(&label, || channel.send(&message)).await;
        match outcome.result {
            Ok(()) => {
                info!("Delivered {} to {}", event.signature, name);
                DeliveryResult {
                    channel: name,
                    succeeded: true,
                    attempts: outcome.attempts,
                    last_error: None,
                }
            }
            Err(e) => {
                error!(
                    "Failed to deliver {} to {} after {} attempt(s): {}",
                    event.signature, name, outcome.attempts, e
                );
                DeliveryResult {
                    channel: name,
                    succeeded: false,
                    attempts: outcome.attempts,
                    last_error: Some(e.to_string()),
                }
            }
        }
    }
}
