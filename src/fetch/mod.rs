pub mod cache;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod throttle;

pub use cache::TransactionCache;
pub use client::{SignatureFeed, SolanaRpcSource, TransactionSource};
pub use error::FetchError;
pub use fetcher::{FetcherConfig, RateLimitedFetcher};
pub use throttle::RequestThrottle;
