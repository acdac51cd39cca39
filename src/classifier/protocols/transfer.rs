use log::warn;

use super::{anomaly, dex_instruction, event, owner_of};
use crate::classifier::chain::Extraction;
use crate::classifier::registry::ClassifierContext;
use crate::classifier::types::{EventDetail, TransferAsset, TransferDetail};
use crate::transaction::balance::{BalanceChange, BalanceDiff};
use crate::transaction::types::{
    Instruction, RawTransaction, SOL_DECIMALS, SYSTEM_PROGRAM_ID, WRAPPED_SOL_MINT,
};

// System program instruction tags (u32 LE, low byte first)
const SYSTEM_TRANSFER: u8 = 2;
const SYSTEM_TRANSFER_WITH_SEED: u8 = 11;

#[derive(Debug, PartialEq, Eq)]
struct NativeTransfer {
    from: String,
    to: String,
    lamports: u64,
}

pub fn matches(tx: &RawTransaction, ctx: &ClassifierContext) -> bool {
    if dex_instruction(tx, ctx).is_some() {
        return false;
    }
    let diff = BalanceDiff::analyze(tx);
    native_transfer(tx, &diff).is_some() || token_transfer(&diff.tokens, tx).is_some()
}

pub fn extract(tx: &RawTransaction, ctx: &ClassifierContext) -> Extraction {
    let diff = BalanceDiff::analyze(tx);

    if let Some(native) = native_transfer(tx, &diff) {
        if !diff.is_supply_conserving(tx.meta.fee) {
            warn!(
                "{} native deltas do not net to the fee of {} lamports",
                tx.signature().unwrap_or("<unsigned>"),
                tx.meta.fee
            );
        }

        if native.lamports <= ctx.dust.sol_lamports {
            return Extraction::Suppressed {
                reason: format!("{} lamports is below the dust threshold", native.lamports),
            };
        }

        let Some(amount) =
            ctx.tokens
                .amount(WRAPPED_SOL_MINT, native.lamports as i128, SOL_DECIMALS)
        else {
            return anomaly("lamport amount out of range");
        };

        return event(
            tx,
            EventDetail::Transfer(TransferDetail {
                asset: TransferAsset::Native,
                from: ctx.wallets.participant(&native.from),
                to: ctx.wallets.participant(&native.to),
                amount,
            }),
        );
    }

    let Some((debit, credit)) = token_transfer(&diff.tokens, tx) else {
        return anomaly("no transfer shape in balances");
    };

    if (credit.amount as u128) < ctx.dust.token_units {
        return Extraction::Suppressed {
            reason: format!("{} raw units is below the dust threshold", credit.amount),
        };
    }

    let (Some(from), Some(to)) = (owner_of(debit, tx), owner_of(credit, tx)) else {
        return anomaly("transfer leg without an owner");
    };
    let Some(amount) = ctx
        .tokens
        .amount(&credit.mint, credit.amount, credit.decimals)
    else {
        return anomaly("token amount out of range");
    };

    event(
        tx,
        EventDetail::Transfer(TransferDetail {
            asset: TransferAsset::Token,
            from: ctx.wallets.participant(&from),
            to: ctx.wallets.participant(&to),
            amount,
        }),
    )
}

/// A system-program transfer between exactly two accounts. A single
/// `jsonParsed` transfer instruction is taken as is; otherwise the lamport
/// deltas must show one debited and one credited account, and the credit is
/// the amount moved. Other system instructions (`createAccount` paying rent)
/// never count.
fn native_transfer(tx: &RawTransaction, diff: &BalanceDiff) -> Option<NativeTransfer> {
    if !tx.instructions().any(is_system_transfer) {
        return None;
    }

    let mut parsed = tx
        .instructions()
        .filter(|ix| ix.program_id == SYSTEM_PROGRAM_ID && ix.parsed_type() == Some("transfer"));
    if let (Some(ix), None) = (parsed.next(), parsed.next()) {
        let info = ix.parsed_info()?;
        return Some(NativeTransfer {
            from: info.get("source")?.as_str()?.to_string(),
            to: info.get("destination")?.as_str()?.to_string(),
            lamports: info.get("lamports")?.as_u64()?,
        });
    }

    let debits: Vec<_> = diff.native_nonzero().filter(|c| c.delta < 0).collect();
    let credits: Vec<_> = diff.native_nonzero().filter(|c| c.delta > 0).collect();
    match (debits.as_slice(), credits.as_slice()) {
        ([debit], [credit]) => Some(NativeTransfer {
            from: debit.account.clone()?,
            to: credit.account.clone()?,
            lamports: u64::try_from(credit.delta).ok()?,
        }),
        _ => None,
    }
}

fn is_system_transfer(ix: &Instruction) -> bool {
    if ix.program_id != SYSTEM_PROGRAM_ID {
        return false;
    }
    match ix.parsed_type() {
        Some(kind) => kind == "transfer" || kind == "transferWithSeed",
        None => matches!(
            ix.data_bytes().as_deref(),
            Some([SYSTEM_TRANSFER | SYSTEM_TRANSFER_WITH_SEED, ..])
        ),
    }
}

/// One mint, debited at one owner and credited at a different one.
fn token_transfer<'a>(
    changes: &'a [BalanceChange],
    tx: &RawTransaction,
) -> Option<(&'a BalanceChange, &'a BalanceChange)> {
    let first = changes.first()?;
    if changes.iter().any(|c| c.mint != first.mint) {
        return None;
    }

    let debits: Vec<_> = changes.iter().filter(|c| c.amount < 0).collect();
    let credits: Vec<_> = changes.iter().filter(|c| c.amount > 0).collect();
    match (debits.as_slice(), credits.as_slice()) {
        ([debit], [credit]) if owner_of(debit, tx) != owner_of(credit, tx) => Some((debit, credit)),
        _ => None,
    }
}
