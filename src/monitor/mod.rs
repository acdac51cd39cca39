pub mod dedup;
pub mod metrics;
pub mod pipeline;
pub mod poller;
pub mod webhook;

pub use dedup::DedupStore;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{DiscoveredTransaction, PipelineOutcome, TransactionPipeline};
pub use poller::{AddressPoller, PollerConfig};
pub use webhook::extract_discoveries;
