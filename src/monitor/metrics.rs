use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::classifier::types::EventKind;

/// Pipeline counters, owned by the pipeline and read by `/status`.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    received: AtomicU64,
    dedup_hits: AtomicU64,
    dedup_misses: AtomicU64,
    fetch_failures: AtomicU64,
    swaps: AtomicU64,
    transfers: AtomicU64,
    mints: AtomicU64,
    add_pools: AtomicU64,
    suppressed: AtomicU64,
    ignored: AtomicU64,
    deliveries_succeeded: AtomicU64,
    deliveries_failed: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub received: u64,
    pub dedup_hits: u64,
    pub dedup_misses: u64,
    pub fetch_failures: u64,
    pub swaps: u64,
    pub transfers: u64,
    pub mints: u64,
    pub add_pools: u64,
    pub suppressed: u64,
    pub ignored: u64,
    pub deliveries_succeeded: u64,
    pub deliveries_failed: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl PipelineMetrics {
    pub fn record_received(&self) {
        bump(&self.received);
    }

    pub fn record_dedup(&self, is_new: bool) {
        if is_new {
            bump(&self.dedup_misses);
        } else {
            bump(&self.dedup_hits);
        }
    }

    pub fn record_fetch_failure(&self) {
        bump(&self.fetch_failures);
    }

    pub fn record_event(&self, kind: EventKind) {
        match kind {
            EventKind::Swap => bump(&self.swaps),
            EventKind::Transfer => bump(&self.transfers),
            EventKind::Mint => bump(&self.mints),
            EventKind::AddPool => bump(&self.add_pools),
        }
    }

    pub fn record_suppressed(&self) {
        bump(&self.suppressed);
    }

    pub fn record_ignored(&self) {
        bump(&self.ignored);
    }

    pub fn record_delivery(&self, succeeded: bool) {
        if succeeded {
            bump(&self.deliveries_succeeded);
        } else {
            bump(&self.deliveries_failed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let read = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            received: read(&self.received),
            dedup_hits: read(&self.dedup_hits),
            dedup_misses: read(&self.dedup_misses),
            fetch_failures: read(&self.fetch_failures),
            swaps: read(&self.swaps),
            transfers: read(&self.transfers),
            mints: read(&self.mints),
            add_pools: read(&self.add_pools),
            suppressed: read(&self.suppressed),
            ignored: read(&self.ignored),
            deliveries_succeeded: read(&self.deliveries_succeeded),
            deliveries_failed: read(&self.deliveries_failed),
        }
    }
}
