use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;

pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Debug, Clone, PartialEq)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self::mainnet_default()
    }
}

impl SolanaConfig {
    // Default mainnet configuration
    pub fn mainnet_default() -> Self {
        Self {
            rpc_url: MAINNET_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
        }
    }

    pub fn custom(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self { rpc_url, commitment }
    }

    pub fn create_rpc_client(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), self.commitment)
    }

    /// The RPC URL with any `api-key` query value hidden, for logging.
    pub fn masked_rpc_url(&self) -> String {
        mask_api_key(&self.rpc_url)
    }
}

fn mask_api_key(url: &str) -> String {
    const KEY: &str = "api-key=";
    let Some(start) = url.find(KEY) else {
        return url.to_string();
    };
    let value_start = start + KEY.len();
    let value_end = url[value_start..]
        .find('&')
        .map_or(url.len(), |offset| value_start + offset);
    format!("{}***{}", &url[..value_start], &url[value_end..])
}
