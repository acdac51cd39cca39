use log::{debug, warn};

use super::protocols::{add_pool, mint, swap, transfer};
use super::registry::ClassifierContext;
use super::types::{EventKind, StructuredEvent};
use crate::transaction::types::RawTransaction;

/// What a classifier produced after its match test passed.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Event(StructuredEvent),
    /// Matched, but not worth reporting. Stops the chain.
    Suppressed { reason: String },
    /// Matched, but the transaction did not hold together. The chain moves on.
    Anomaly { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Event(StructuredEvent),
    Suppressed { kind: EventKind, reason: String },
    Unrecognized,
}

type MatchFn = fn(&RawTransaction, &ClassifierContext) -> bool;
type ExtractFn = fn(&RawTransaction, &ClassifierContext) -> Extraction;

#[derive(Clone, Copy)]
pub struct Classifier {
    pub kind: EventKind,
    matches: MatchFn,
    extract: ExtractFn,
}

impl Classifier {
    pub const fn new(kind: EventKind, matches: MatchFn, extract: ExtractFn) -> Self {
        Self {
            kind,
            matches,
            extract,
        }
    }

    pub fn matches(&self, tx: &RawTransaction, ctx: &ClassifierContext) -> bool {
        (self.matches)(tx, ctx)
    }

    pub fn extract(&self, tx: &RawTransaction, ctx: &ClassifierContext) -> Extraction {
        (self.extract)(tx, ctx)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier").field("kind", &self.kind).finish()
    }
}

pub const SWAP: Classifier = Classifier::new(EventKind::Swap, swap::matches, swap::extract);
pub const TRANSFER: Classifier =
    Classifier::new(EventKind::Transfer, transfer::matches, transfer::extract);
pub const MINT: Classifier = Classifier::new(EventKind::Mint, mint::matches, mint::extract);
pub const ADD_POOL: Classifier =
    Classifier::new(EventKind::AddPool, add_pool::matches, add_pool::extract);

/// Classifiers tried in priority order; the first one that matches and
/// extracts decides the outcome.
#[derive(Debug, Clone)]
pub struct ClassifierChain {
    context: ClassifierContext,
    classifiers: Vec<Classifier>,
}

impl ClassifierChain {
    pub fn new(context: ClassifierContext, classifiers: Vec<Classifier>) -> Self {
        Self {
            context,
            classifiers,
        }
    }

    /// Swap, Transfer, Mint, AddPool.
    pub fn standard(context: ClassifierContext) -> Self {
        Self::new(context, vec![SWAP, TRANSFER, MINT, ADD_POOL])
    }

    pub fn context(&self) -> &ClassifierContext {
        &self.context
    }

    pub fn classify(&self, tx: &RawTransaction) -> Classification {
        let signature = tx.signature().unwrap_or("<unsigned>");

        for classifier in &self.classifiers {
            if !classifier.matches(tx, &self.context) {
                continue;
            }

            match classifier.extract(tx, &self.context) {
                Extraction::Event(event) => {
                    debug!("{} classified as {}", signature, classifier.kind);
                    return Classification::Event(event);
                }
                Extraction::Suppressed { reason } => {
                    debug!("{} suppressed by {}: {}", signature, classifier.kind, reason);
                    return Classification::Suppressed {
                        kind: classifier.kind,
                        reason,
                    };
                }
                Extraction::Anomaly { reason } => {
                    warn!(
                        "{} matched {} but could not be extracted: {}",
                        signature, classifier.kind, reason
                    );
                }
            }
        }

        Classification::Unrecognized
    }
}
