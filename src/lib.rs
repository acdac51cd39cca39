pub mod classifier;
pub mod config;
pub mod fetch;
pub mod monitor;
pub mod notify;
pub mod retry;
pub mod solana_config;
pub mod transaction;

pub use solana_config::SolanaConfig;

// Re-export key types
pub use classifier::{Classification, ClassifierChain, ClassifierContext, EventKind, StructuredEvent};
pub use config::{AppConfig, ConfigError};
pub use fetch::{FetchError, RateLimitedFetcher, SolanaRpcSource};
pub use monitor::{AddressPoller, DedupStore, DiscoveredTransaction, PipelineOutcome, TransactionPipeline};
pub use notify::{DeliveryResult, NotificationChannel, NotificationDispatcher};
pub use retry::{RetryConfig, RetryHandler};
pub use transaction::{BalanceDiff, RawTransaction};
