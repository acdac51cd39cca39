use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::transaction::types::RawTransaction;

/// Recently fetched transactions, so a signature seen through both the
/// webhook and the poll loop is only fetched once.
#[derive(Debug)]
pub struct TransactionCache {
    entries: Mutex<LruCache<String, (Instant, RawTransaction)>>,
    ttl: Duration,
}

impl TransactionCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn get(&self, signature: &str) -> Option<RawTransaction> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(signature) {
            Some((stored_at, tx)) if stored_at.elapsed() < self.ttl => return Some(tx.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(signature);
        }
        None
    }

    pub async fn insert(&self, signature: &str, tx: RawTransaction) {
        self.entries
            .lock()
            .await
            .put(signature.to_string(), (Instant::now(), tx));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
