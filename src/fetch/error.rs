use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::RpcError;
use thiserror::Error;

use crate::retry::Retryable;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by upstream")]
    RateLimited,

    #[error("Transaction {0} not available")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Rpc(_)
                | FetchError::Network(_)
                | FetchError::RateLimited
                | FetchError::NotFound(_)
        )
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        FetchError::is_retryable(self)
    }
}

impl From<ClientError> for FetchError {
    fn from(error: ClientError) -> Self {
        match error.kind() {
            ClientErrorKind::Io(e) => FetchError::Network(e.to_string()),
            ClientErrorKind::Reqwest(e) => match e.status().map(|s| s.as_u16()) {
                Some(429) => FetchError::RateLimited,
                _ => FetchError::Network(e.to_string()),
            },
            ClientErrorKind::SerdeJson(e) => FetchError::Decode(e.to_string()),
            ClientErrorKind::RpcError(RpcError::ParseError(message)) => {
                FetchError::Decode(message.clone())
            }
            ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
                if *code == 429 {
                    FetchError::RateLimited
                } else {
                    FetchError::Rpc(format!("{} ({})", message, code))
                }
            }
            _ => FetchError::Rpc(error.to_string()),
        }
    }
}
