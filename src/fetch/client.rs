use std::str::FromStr;

use async_trait::async_trait;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::UiTransactionEncoding;

use super::error::FetchError;
use crate::transaction::types::RawTransaction;

/// Upstream lookup of full transaction detail by signature.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn get_transaction(&self, signature: &str) -> Result<RawTransaction, FetchError>;
}

/// Recent signatures touching an address, newest first, stopping before `until`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignatureFeed: Send + Sync {
    async fn recent_signatures(
        &self,
        address: &str,
        until: Option<String>,
        limit: usize,
    ) -> Result<Vec<String>, FetchError>;
}

pub struct SolanaRpcSource {
    client: RpcClient,
}

impl SolanaRpcSource {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransactionSource for SolanaRpcSource {
    async fn get_transaction(&self, signature: &str) -> Result<RawTransaction, FetchError> {
        let parsed = Signature::from_str(signature)
            .map_err(|e| FetchError::InvalidSignature(format!("{}: {}", signature, e)))?;

        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(self.client.commitment()),
            max_supported_transaction_version: Some(0),
        };

        // `null` until the transaction is visible at our commitment
        let result: Option<RawTransaction> = self
            .client
            .send(
                RpcRequest::GetTransaction,
                json!([parsed.to_string(), config]),
            )
            .await?;

        result.ok_or_else(|| FetchError::NotFound(signature.to_string()))
    }
}

#[async_trait]
impl SignatureFeed for SolanaRpcSource {
    async fn recent_signatures(
        &self,
        address: &str,
        until: Option<String>,
        limit: usize,
    ) -> Result<Vec<String>, FetchError> {
        let pubkey = Pubkey::from_str(address)
            .map_err(|e| FetchError::InvalidAddress(format!("{}: {}", address, e)))?;
        let until = until
            .map(|s| Signature::from_str(&s).map_err(|e| FetchError::InvalidSignature(format!("{}: {}", s, e))))
            .transpose()?;

        let config = GetConfirmedSignaturesForAddress2Config {
            before: None,
            until,
            limit: Some(limit),
            commitment: Some(self.client.commitment()),
        };

        let statuses = self
            .client
            .get_signatures_for_address_with_config(&pubkey, config)
            .await?;

        Ok(statuses.into_iter().map(|status| status.signature).collect())
    }
}
