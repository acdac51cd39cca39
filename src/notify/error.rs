use teloxide::RequestError;
use thiserror::Error;

use crate::retry::Retryable;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Channel misconfigured: {0}")]
    Misconfigured(String),
}

impl ChannelError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::Transport(_) => true,
            ChannelError::Api { status, .. } => *status == 429 || *status >= 500,
            ChannelError::Rejected(_) | ChannelError::Misconfigured(_) => false,
        }
    }
}

impl Retryable for ChannelError {
    fn is_retryable(&self) -> bool {
        ChannelError::is_retryable(self)
    }
}

impl From<RequestError> for ChannelError {
    fn from(error: RequestError) -> Self {
        let message = error.to_string();
        match error {
            RequestError::Network(_) | RequestError::Io(_) => ChannelError::Transport(message),
            RequestError::RetryAfter(_) => ChannelError::Api {
                status: 429,
                message,
            },
            RequestError::Api(_) | RequestError::MigrateToChatId(_) => {
                ChannelError::Rejected(message)
            }
            _ => ChannelError::Transport(message),
        }
    }
}
