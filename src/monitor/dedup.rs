use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use log::info;

pub const DEFAULT_CEILING: usize = 10_000;

/// Bounded set of transaction signatures already claimed by a pipeline run.
///
/// `mark_if_new` is the only claim point: for any signature exactly one caller
/// ever sees `true`, until compaction forgets it. Nothing is persisted, so a
/// restart may deliver a transaction again.
#[derive(Debug)]
pub struct DedupStore {
    state: Mutex<DedupState>,
    ceiling: usize,
}

#[derive(Debug, Default)]
struct DedupState {
    seen: HashSet<String>,
    // Insertion order, oldest first
    order: VecDeque<String>,
    compactions: u64,
}

impl Default for DedupStore {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING)
    }
}

impl DedupStore {
    pub fn new(ceiling: usize) -> Self {
        Self {
            state: Mutex::new(DedupState::default()),
            ceiling: ceiling.max(1),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Record `signature`; `true` only if it was not already present.
    /// Growing past the ceiling compacts down to half of it, never below the
    /// claim just made.
    pub fn mark_if_new(&self, signature: &str) -> bool {
        let mut state = self.lock();
        if state.seen.contains(signature) {
            return false;
        }

        state.seen.insert(signature.to_string());
        state.order.push_back(signature.to_string());

        if state.order.len() > self.ceiling {
            let target = (self.ceiling / 2).max(1);
            let removed = compact_locked(&mut state, target);
            info!(
                "Dedup store passed {} entries, dropped {} oldest, kept {}",
                self.ceiling,
                removed,
                state.order.len()
            );
        }
        true
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.lock().seen.contains(signature)
    }

    pub fn size(&self) -> usize {
        self.lock().order.len()
    }

    /// Keep only the `target` most recently inserted signatures. Returns how
    /// many were dropped.
    pub fn compact(&self, target: usize) -> usize {
        compact_locked(&mut self.lock(), target)
    }

    pub fn compactions(&self) -> u64 {
        self.lock().compactions
    }

    // A poisoned lock means a claim was interrupted half way; the set can no
    // longer be trusted to answer "seen before".
    fn lock(&self) -> MutexGuard<'_, DedupState> {
        self.state.lock().expect("dedup store lock poisoned")
    }
}

fn compact_locked(state: &mut DedupState, target: usize) -> usize {
    let excess = state.order.len().saturating_sub(target);
    if excess == 0 {
        return 0;
    }
    for signature in state.order.drain(..excess) {
        state.seen.remove(&signature);
    }
    state.compactions += 1;
    excess
}
