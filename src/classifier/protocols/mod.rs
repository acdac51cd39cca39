pub mod add_pool;
pub mod mint;
pub mod swap;
pub mod transfer;

use super::chain::Extraction;
use super::registry::ClassifierContext;
use super::types::{EventDetail, StructuredEvent};
use crate::transaction::balance::BalanceChange;
use crate::transaction::types::{Instruction, RawTransaction};

pub(crate) fn dex_instruction<'a>(
    tx: &'a RawTransaction,
    ctx: &ClassifierContext,
) -> Option<&'a Instruction> {
    tx.instructions().find(|ix| ctx.programs.is_dex(&ix.program_id))
}

/// Owner of a token balance; falls back to the token account itself.
pub(crate) fn owner_of(change: &BalanceChange, tx: &RawTransaction) -> Option<String> {
    change
        .owner
        .clone()
        .or_else(|| tx.account_key(change.account_index as usize).map(str::to_string))
}

pub(crate) fn event(tx: &RawTransaction, detail: EventDetail) -> Extraction {
    match tx.signature() {
        Some(signature) => {
            Extraction::Event(StructuredEvent::new(signature, tx.block_time(), detail))
        }
        None => Extraction::Anomaly {
            reason: "transaction carries no signature".to_string(),
        },
    }
}

pub(crate) fn anomaly(reason: impl Into<String>) -> Extraction {
    Extraction::Anomaly {
        reason: reason.into(),
    }
}
