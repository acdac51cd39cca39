use serde_json::Value;

use super::{anomaly, event};
use crate::classifier::chain::Extraction;
use crate::classifier::registry::ClassifierContext;
use crate::classifier::types::{EventDetail, MintDetail};
use crate::transaction::types::{Instruction, RawTransaction, SOL_DECIMALS, TOKEN_PROGRAM_ID};

// SPL token instruction tags
const MINT_TO: u8 = 7;
const MINT_TO_CHECKED: u8 = 14;

#[derive(Debug, Default, PartialEq, Eq)]
struct MintInstruction {
    mint: Option<String>,
    destination: Option<String>,
    authority: Option<String>,
    amount: Option<u64>,
    decimals: Option<u8>,
}

pub fn matches(tx: &RawTransaction, _ctx: &ClassifierContext) -> bool {
    mint_instruction(tx).is_some()
}

pub fn extract(tx: &RawTransaction, ctx: &ClassifierContext) -> Extraction {
    let Some(ix) = mint_instruction(tx) else {
        return anomaly("no mint instruction");
    };
    let decoded = decode(ix);

    let (Some(mint), Some(destination), Some(raw_amount)) =
        (decoded.mint, decoded.destination, decoded.amount)
    else {
        return anomaly("mint instruction is missing mint, destination or amount");
    };

    let decimals = decoded
        .decimals
        .or_else(|| {
            tx.meta
                .post_token_balances
                .iter()
                .find(|b| b.mint == mint)
                .map(|b| b.ui_token_amount.decimals)
        })
        .or_else(|| ctx.tokens.lookup(&mint).map(|info| info.decimals))
        .unwrap_or(SOL_DECIMALS);

    let Some(token) = ctx.tokens.amount(&mint, raw_amount as i128, decimals) else {
        return anomaly("mint amount out of range");
    };

    // Report the wallet behind the receiving token account when we know it
    let recipient = tx
        .meta
        .post_token_balances
        .iter()
        .find(|b| tx.account_key(b.account_index as usize) == Some(destination.as_str()))
        .and_then(|b| b.owner.clone())
        .unwrap_or(destination);

    event(
        tx,
        EventDetail::Mint(MintDetail {
            token,
            destination: ctx.wallets.participant(&recipient),
            authority: decoded
                .authority
                .as_deref()
                .map(|authority| ctx.wallets.participant(authority)),
        }),
    )
}

fn mint_instruction(tx: &RawTransaction) -> Option<&Instruction> {
    tx.instructions()
        .find(|ix| ix.program_id == TOKEN_PROGRAM_ID && is_mint_op(ix))
}

fn is_mint_op(ix: &Instruction) -> bool {
    match ix.parsed_type() {
        Some(kind) => kind == "mintTo" || kind == "mintToChecked",
        None => matches!(
            ix.data_bytes().and_then(|data| data.first().copied()),
            Some(MINT_TO) | Some(MINT_TO_CHECKED)
        ),
    }
}

fn decode(ix: &Instruction) -> MintInstruction {
    if let Some(info) = ix.parsed_info() {
        let field = |key: &str| info.get(key).and_then(Value::as_str).map(str::to_string);
        let checked = info.get("tokenAmount");
        return MintInstruction {
            mint: field("mint"),
            destination: field("account"),
            authority: field("mintAuthority").or_else(|| field("multisigMintAuthority")),
            amount: checked
                .and_then(|t| t.get("amount"))
                .or_else(|| info.get("amount"))
                .and_then(number),
            decimals: checked
                .and_then(|t| t.get("decimals"))
                .and_then(Value::as_u64)
                .and_then(|d| u8::try_from(d).ok()),
        };
    }

    // Raw layout: tag, u64 LE amount, then a decimals byte for MintToChecked.
    // Accounts are [mint, destination, authority].
    let data = ix.data_bytes().unwrap_or_default();
    let amount = data
        .get(1..9)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes);
    let decimals = match data.first() {
        Some(&MINT_TO_CHECKED) => data.get(9).copied(),
        _ => None,
    };

    MintInstruction {
        mint: ix.accounts.first().cloned(),
        destination: ix.accounts.get(1).cloned(),
        authority: ix.accounts.get(2).cloned(),
        amount,
        decimals,
    }
}

// Providers send amounts as strings, some as bare numbers.
fn number(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
