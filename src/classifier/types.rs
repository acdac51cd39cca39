use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Swap,
    Transfer,
    Mint,
    AddPool,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Swap => "swap",
            EventKind::Transfer => "transfer",
            EventKind::Mint => "mint",
            EventKind::AddPool => "add_pool",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An on-chain account, with the display name it is known by, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: String,
    pub label: Option<String>,
}

impl Participant {
    pub fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.address)
    }
}

/// Decimals-normalized amount of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    pub mint: String,
    pub symbol: String,
    pub decimals: u8,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venue {
    pub program_id: String,
    pub name: Option<String>,
}

impl Venue {
    pub fn display(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.program_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAction {
    /// Wrapped SOL was spent.
    Buy,
    /// Wrapped SOL was received.
    Sell,
    /// Token to token, no SOL leg.
    Swap,
}

impl SwapAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapAction::Buy => "buy",
            SwapAction::Sell => "sell",
            SwapAction::Swap => "swap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapDetail {
    pub trader: Participant,
    pub action: SwapAction,
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub venue: Venue,
    pub pool: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAsset {
    Native,
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDetail {
    pub asset: TransferAsset,
    pub from: Participant,
    pub to: Participant,
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintDetail {
    pub token: TokenAmount,
    pub destination: Participant,
    pub authority: Option<Participant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPoolDetail {
    pub pool: String,
    pub venue: Venue,
    pub initiator: Option<Participant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDetail {
    Swap(SwapDetail),
    Transfer(TransferDetail),
    Mint(MintDetail),
    AddPool(AddPoolDetail),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub label: &'static str,
    pub url: String,
}

/// Classified, display-ready form of one transaction. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredEvent {
    pub signature: String,
    pub block_time: Option<DateTime<Utc>>,
    pub detail: EventDetail,
    pub links: Vec<DeepLink>,
}

impl StructuredEvent {
    pub fn new(signature: &str, block_time: Option<DateTime<Utc>>, detail: EventDetail) -> Self {
        let links = deep_links(signature, contract_of(&detail));
        Self {
            signature: signature.to_string(),
            block_time,
            detail,
            links,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.detail {
            EventDetail::Swap(_) => EventKind::Swap,
            EventDetail::Transfer(_) => EventKind::Transfer,
            EventDetail::Mint(_) => EventKind::Mint,
            EventDetail::AddPool(_) => EventKind::AddPool,
        }
    }

    /// Mint address the event is about, when there is one.
    pub fn contract(&self) -> Option<&str> {
        contract_of(&self.detail)
    }
}

fn contract_of(detail: &EventDetail) -> Option<&str> {
    match detail {
        EventDetail::Swap(swap) => Some(match swap.action {
            SwapAction::Sell => swap.input.mint.as_str(),
            SwapAction::Buy | SwapAction::Swap => swap.output.mint.as_str(),
        }),
        EventDetail::Transfer(transfer) => match transfer.asset {
            TransferAsset::Token => Some(transfer.amount.mint.as_str()),
            TransferAsset::Native => None,
        },
        EventDetail::Mint(mint) => Some(mint.token.mint.as_str()),
        EventDetail::AddPool(_) => None,
    }
}

pub fn deep_links(signature: &str, contract: Option<&str>) -> Vec<DeepLink> {
    let mut links = vec![DeepLink {
        label: "Solscan",
        url: format!("https://solscan.io/tx/{}", signature),
    }];

    if let Some(mint) = contract {
        links.push(DeepLink {
            label: "GMGN",
            url: format!("https://gmgn.ai/sol/token/{}", mint),
        });
        links.push(DeepLink {
            label: "Axiom",
            url: format!("https://axiom.trade/t/{}", mint),
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(mint: &str, symbol: &str) -> TokenAmount {
        TokenAmount {
            mint: mint.to_string(),
            symbol: symbol.to_string(),
            decimals: 6,
            amount: Decimal::ONE,
        }
    }

    #[test]
    fn test_sell_contract_is_input_mint() {
        let event = StructuredEvent::new(
            "sig",
            None,
            EventDetail::Swap(SwapDetail {
                trader: Participant { address: "T".into(), label: None },
                action: SwapAction::Sell,
                input: token("MEME", "MEME"),
                output: token("So11111111111111111111111111111111111111112", "SOL"),
                venue: Venue { program_id: "P".into(), name: None },
                pool: None,
            }),
        );

        assert_eq!(event.kind(), EventKind::Swap);
        assert_eq!(event.contract(), Some("MEME"));
        assert_eq!(event.links.len(), 3);
        assert_eq!(event.links[0].url, "https://solscan.io/tx/sig");
        assert!(event.links[1].url.ends_with("/MEME"));
    }

    #[test]
    fn test_native_transfer_has_only_explorer_link() {
        let event = StructuredEvent::new(
            "sig",
            None,
            EventDetail::Transfer(TransferDetail {
                asset: TransferAsset::Native,
                from: Participant { address: "A".into(), label: Some("Alice".into()) },
                to: Participant { address: "B".into(), label: None },
                amount: token("So11111111111111111111111111111111111111112", "SOL"),
            }),
        );

        assert_eq!(event.links.len(), 1);
        assert_eq!(event.contract(), None);
        if let EventDetail::Transfer(t) = &event.detail {
            assert_eq!(t.from.display(), "Alice");
            assert_eq!(t.to.display(), "B");
        }
    }
}
