use super::{anomaly, dex_instruction, event, owner_of};
use crate::classifier::chain::Extraction;
use crate::classifier::registry::ClassifierContext;
use crate::classifier::types::{EventDetail, SwapAction, SwapDetail};
use crate::transaction::balance::{BalanceChange, BalanceDiff};
use crate::transaction::types::{RawTransaction, WRAPPED_SOL_MINT};

pub fn matches(tx: &RawTransaction, ctx: &ClassifierContext) -> bool {
    dex_instruction(tx, ctx).is_some() && BalanceDiff::analyze(tx).has_debit_and_credit()
}

pub fn extract(tx: &RawTransaction, ctx: &ClassifierContext) -> Extraction {
    let Some(dex) = dex_instruction(tx, ctx) else {
        return anomaly("no DEX instruction");
    };

    let diff = BalanceDiff::analyze(tx);
    let candidates = candidate_changes(&diff.tokens, tx, ctx);

    let (Some(input), Some(output)) = (most_negative(&candidates), most_positive(&candidates))
    else {
        return anomaly("no debited and credited token pair");
    };
    if input.mint == output.mint {
        return anomaly(format!("input and output share mint {}", input.mint));
    }

    let (Some(input_amount), Some(output_amount)) = (
        ctx.tokens.amount(&input.mint, -input.amount, input.decimals),
        ctx.tokens.amount(&output.mint, output.amount, output.decimals),
    ) else {
        return anomaly("token amount out of range");
    };

    let Some(trader) = owner_of(input, tx)
        .or_else(|| owner_of(output, tx))
        .or_else(|| tx.fee_payer().map(str::to_string))
    else {
        return anomaly("no trader account");
    };

    let action = if input.mint == WRAPPED_SOL_MINT {
        SwapAction::Buy
    } else if output.mint == WRAPPED_SOL_MINT {
        SwapAction::Sell
    } else {
        SwapAction::Swap
    };

    event(
        tx,
        EventDetail::Swap(SwapDetail {
            trader: ctx.wallets.participant(&trader),
            action,
            input: input_amount,
            output: output_amount,
            venue: ctx.programs.dex_venue(&dex.program_id),
            pool: dex.accounts.first().cloned(),
        }),
    )
}

/// Restrict to a watched wallet's own legs when it both spent and received;
/// route hops and fee accounts would otherwise compete for the extremes.
fn candidate_changes<'a>(
    changes: &'a [BalanceChange],
    tx: &RawTransaction,
    ctx: &ClassifierContext,
) -> Vec<&'a BalanceChange> {
    let watched = changes.iter().filter_map(|c| owner_of(c, tx)).find(|owner| {
        ctx.wallets.contains(owner)
            && changes
                .iter()
                .any(|c| c.amount < 0 && owner_of(c, tx).as_ref() == Some(owner))
            && changes
                .iter()
                .any(|c| c.amount > 0 && owner_of(c, tx).as_ref() == Some(owner))
    });

    match watched {
        Some(owner) => changes
            .iter()
            .filter(|c| owner_of(c, tx).as_deref() == Some(owner.as_str()))
            .collect(),
        None => changes.iter().collect(),
    }
}

// Ties keep the first change seen.
fn most_negative<'a>(changes: &[&'a BalanceChange]) -> Option<&'a BalanceChange> {
    changes
        .iter()
        .copied()
        .filter(|c| c.amount < 0)
        .fold(None, |best: Option<&BalanceChange>, c| match best {
            Some(b) if b.amount <= c.amount => Some(b),
            _ => Some(c),
        })
}

fn most_positive<'a>(changes: &[&'a BalanceChange]) -> Option<&'a BalanceChange> {
    changes
        .iter()
        .copied()
        .filter(|c| c.amount > 0)
        .fold(None, |best: Option<&BalanceChange>, c| match best {
            Some(b) if b.amount >= c.amount => Some(b),
            _ => Some(c),
        })
}
