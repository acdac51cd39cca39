use async_trait::async_trait;

use super::error::ChannelError;
use super::types::{MessageFormat, RenderedMessage};

/// One outbound notification destination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> String;

    fn format(&self) -> MessageFormat;

    async fn send(&self, message: &RenderedMessage) -> Result<(), ChannelError>;
}
