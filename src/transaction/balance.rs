use log::debug;

use super::types::RawTransaction;

/// Pre/post delta of one SPL token balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub account_index: u32,
    pub mint: String,
    pub owner: Option<String>,
    /// Raw base units, `post - pre`.
    pub amount: i128,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBalanceChange {
    pub account_index: usize,
    pub account: Option<String>,
    /// Lamports, `post - pre`.
    pub delta: i128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceDiff {
    pub tokens: Vec<BalanceChange>,
    pub native: Vec<NativeBalanceChange>,
}

impl BalanceDiff {
    pub fn analyze(tx: &RawTransaction) -> Self {
        Self {
            tokens: token_changes(tx),
            native: native_changes(tx),
        }
    }

    pub fn has_debit_and_credit(&self) -> bool {
        self.tokens.iter().any(|c| c.amount < 0) && self.tokens.iter().any(|c| c.amount > 0)
    }

    pub fn native_nonzero(&self) -> impl Iterator<Item = &NativeBalanceChange> {
        self.native.iter().filter(|c| c.delta != 0)
    }

    /// Lamports are conserved when every native delta plus the fee nets to zero.
    pub fn is_supply_conserving(&self, fee: u64) -> bool {
        let net: i128 = self.native.iter().map(|c| c.delta).sum();
        net + fee as i128 == 0
    }
}

/// Token balance deltas, in post-balance order.
///
/// Each post entry is paired with the pre entry at the same position; the pair
/// only counts when both describe the same account and mint. Unpaired entries,
/// unparseable amounts and zero deltas are dropped.
pub fn token_changes(tx: &RawTransaction) -> Vec<BalanceChange> {
    let pre_balances = &tx.meta.pre_token_balances;

    tx.meta
        .post_token_balances
        .iter()
        .enumerate()
        .filter_map(|(i, post)| {
            let pre = pre_balances.get(i)?;
            if pre.mint != post.mint || pre.account_index != post.account_index {
                debug!(
                    "token balance {} not paired: pre {}@{} post {}@{}",
                    i, pre.mint, pre.account_index, post.mint, post.account_index
                );
                return None;
            }

            let pre_amount = pre.ui_token_amount.raw()?;
            let post_amount = post.ui_token_amount.raw()?;
            let delta = post_amount as i128 - pre_amount as i128;
            if delta == 0 {
                return None;
            }

            Some(BalanceChange {
                account_index: post.account_index,
                mint: post.mint.clone(),
                owner: post.owner.clone().or_else(|| pre.owner.clone()),
                amount: delta,
                decimals: post.ui_token_amount.decimals,
            })
        })
        .collect()
}

/// Lamport deltas for every account index present in both snapshots.
pub fn native_changes(tx: &RawTransaction) -> Vec<NativeBalanceChange> {
    tx.meta
        .pre_balances
        .iter()
        .zip(tx.meta.post_balances.iter())
        .enumerate()
        .map(|(i, (pre, post))| NativeBalanceChange {
            account_index: i,
            account: tx.account_key(i).map(str::to_string),
            delta: *post as i128 - *pre as i128,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::types::fixtures::{token_balance, tx};
    use crate::transaction::types::WRAPPED_SOL_MINT;
    use serde_json::json;

    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn test_token_changes_with_balances() {
        let tx = tx(json!({
            "meta": {
                "preTokenBalances": [
                    token_balance(2, WRAPPED_SOL_MINT, "Trader", 1_000_000_000, 9),
                    token_balance(4, USDC, "Trader", 5_000_000, 6)
                ],
                "postTokenBalances": [
                    token_balance(2, WRAPPED_SOL_MINT, "Trader", 500_000_000, 9),
                    token_balance(4, USDC, "Trader", 10_000_000, 6)
                ]
            }
        }));

        let changes = token_changes(&tx);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].mint, WRAPPED_SOL_MINT);
        assert_eq!(changes[0].amount, -500_000_000);
        assert_eq!(changes[0].decimals, 9);
        assert_eq!(changes[1].mint, USDC);
        assert_eq!(changes[1].amount, 5_000_000);
        assert_eq!(changes[1].owner.as_deref(), Some("Trader"));
    }

    #[test]
    fn test_token_changes_no_change() {
        let tx = tx(json!({
            "meta": {
                "preTokenBalances": [ token_balance(2, USDC, "A", 42, 6), token_balance(3, USDC, "B", 7, 6) ],
                "postTokenBalances": [ token_balance(2, USDC, "A", 42, 6), token_balance(3, USDC, "B", 7, 6) ]
            }
        }));
        assert!(token_changes(&tx).is_empty());
    }

    #[test]
    fn test_token_changes_missing_arrays() {
        let tx = tx(json!({ "meta": { "preBalances": [1, 2], "postBalances": [2, 1] } }));
        assert!(token_changes(&tx).is_empty());

        let empty = tx_without_meta();
        assert_eq!(BalanceDiff::analyze(&empty), BalanceDiff::default());
    }

    fn tx_without_meta() -> RawTransaction {
        tx(json!({}))
    }

    #[test]
    fn test_unpaired_entries_are_dropped() {
        // Post has an extra entry with no pre counterpart, and index 0 mismatches mint.
        let tx = tx(json!({
            "meta": {
                "preTokenBalances": [ token_balance(2, USDC, "A", 10, 6) ],
                "postTokenBalances": [
                    token_balance(2, WRAPPED_SOL_MINT, "A", 99, 9),
                    token_balance(5, USDC, "B", 500, 6)
                ]
            }
        }));
        assert!(token_changes(&tx).is_empty());
    }

    #[test]
    fn test_malformed_amount_is_skipped() {
        let tx = tx(json!({
            "meta": {
                "preTokenBalances": [
                    { "accountIndex": 1, "mint": USDC, "uiTokenAmount": { "amount": "abc", "decimals": 6 } },
                    token_balance(2, USDC, "B", 1, 6)
                ],
                "postTokenBalances": [
                    { "accountIndex": 1, "mint": USDC, "uiTokenAmount": { "amount": "5", "decimals": 6 } },
                    token_balance(2, USDC, "B", 3, 6)
                ]
            }
        }));
        let changes = token_changes(&tx);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].account_index, 2);
        assert_eq!(changes[0].amount, 2);
    }

    #[test]
    fn test_native_changes() {
        let tx = tx(json!({
            "meta": {
                "fee": 0,
                "preBalances": [5_000_000_000u64, 1_000_000_000u64, 7],
                "postBalances": [4_000_000_000u64, 2_000_000_000u64]
            },
            "transaction": { "message": { "accountKeys": ["Sender", "Recipient", "Other"] } }
        }));

        let native = native_changes(&tx);
        assert_eq!(native.len(), 2);
        assert_eq!(native[0].delta, -1_000_000_000);
        assert_eq!(native[0].account.as_deref(), Some("Sender"));
        assert_eq!(native[1].delta, 1_000_000_000);

        let diff = BalanceDiff::analyze(&tx);
        assert!(diff.is_supply_conserving(0));
        assert!(!diff.is_supply_conserving(5000));
    }

    #[test]
    fn test_has_debit_and_credit() {
        let tx = tx(json!({
            "meta": {
                "preTokenBalances": [ token_balance(1, USDC, "A", 10, 6) ],
                "postTokenBalances": [ token_balance(1, USDC, "A", 4, 6) ]
            }
        }));
        assert!(!BalanceDiff::analyze(&tx).has_debit_and_credit());
    }
}
