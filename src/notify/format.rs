use rust_decimal::Decimal;
use teloxide::utils::html;

use super::types::{MessageFormat, RenderedMessage};
use crate::classifier::types::{
    EventDetail, Participant, StructuredEvent, SwapAction, TokenAmount, TransferAsset,
};

const THOUSAND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Human amount: `1.50M`, `12.35K`, or up to four decimals below a thousand.
/// The suffix is picked after rounding, so `999.99996` reads `1.00K`.
pub fn format_amount(amount: Decimal) -> String {
    let plain = amount.round_dp(4);
    if plain.abs() < THOUSAND {
        return plain.normalize().to_string();
    }
    let thousands = (amount / THOUSAND).round_dp(2);
    if thousands.abs() < THOUSAND {
        return format!("{:.2}K", thousands);
    }
    format!("{:.2}M", (amount / MILLION).round_dp(2))
}

pub fn render(event: &StructuredEvent, format: MessageFormat) -> RenderedMessage {
    let text = Renderer { format }.event(event);
    RenderedMessage { format, text }
}

struct Renderer {
    format: MessageFormat,
}

impl Renderer {
    fn event(&self, event: &StructuredEvent) -> String {
        let mut lines = match &event.detail {
            EventDetail::Swap(swap) => {
                let (emoji, action) = match swap.action {
                    SwapAction::Buy => ("🟢", "BUY"),
                    SwapAction::Sell => ("🔴", "SELL"),
                    SwapAction::Swap => ("🔄", "SWAP"),
                };
                let mut lines = vec![
                    self.title(emoji, action),
                    format!("👤 Trader: {}", self.participant(&swap.trader)),
                    format!("💸 Spent: {}", self.amount(&swap.input)),
                    format!("💰 Received: {}", self.amount(&swap.output)),
                    format!("🏦 Venue: {}", self.text(swap.venue.display())),
                ];
                if let Some(pool) = &swap.pool {
                    lines.push(format!("🏊 Pool: {}", self.code(pool)));
                }
                lines
            }
            EventDetail::Transfer(transfer) => {
                let title = match transfer.asset {
                    TransferAsset::Native => "SOL TRANSFER",
                    TransferAsset::Token => "TOKEN TRANSFER",
                };
                vec![
                    self.title("💸", title),
                    format!("📤 From: {}", self.participant(&transfer.from)),
                    format!("📥 To: {}", self.participant(&transfer.to)),
                    format!("💰 Amount: {}", self.amount(&transfer.amount)),
                ]
            }
            EventDetail::Mint(mint) => {
                let mut lines = vec![
                    self.title("🪙", "MINT"),
                    format!("💰 Minted: {}", self.amount(&mint.token)),
                    format!("📥 To: {}", self.participant(&mint.destination)),
                ];
                if let Some(authority) = &mint.authority {
                    lines.push(format!("🔑 Authority: {}", self.participant(authority)));
                }
                lines
            }
            EventDetail::AddPool(pool) => {
                let mut lines = vec![
                    self.title("🏊", "NEW POOL"),
                    format!("🏊 Pool: {}", self.code(&pool.pool)),
                    format!("🏦 Venue: {}", self.text(pool.venue.display())),
                ];
                if let Some(initiator) = &pool.initiator {
                    lines.push(format!("👤 Created by: {}", self.participant(initiator)));
                }
                lines
            }
        };

        if let Some(contract) = event.contract() {
            lines.push(format!("📜 Contract: {}", self.code(contract)));
        }

        let time = event
            .block_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("🕒 Time: {}", time));
        lines.push(self.links(event));

        lines.join("\n")
    }

    fn title(&self, emoji: &str, title: &str) -> String {
        match self.format {
            MessageFormat::Html => format!("{} <b>{}</b>", emoji, title),
            MessageFormat::PlainText => format!("{} {}", emoji, title),
        }
    }

    fn text(&self, value: &str) -> String {
        match self.format {
            MessageFormat::Html => html::escape(value),
            MessageFormat::PlainText => value.to_string(),
        }
    }

    fn code(&self, value: &str) -> String {
        match self.format {
            MessageFormat::Html => format!("<code>{}</code>", html::escape(value)),
            MessageFormat::PlainText => value.to_string(),
        }
    }

    fn participant(&self, participant: &Participant) -> String {
        match &participant.label {
            Some(label) => format!("{} ({})", self.text(label), self.code(&participant.address)),
            None => self.code(&participant.address),
        }
    }

    fn amount(&self, token: &TokenAmount) -> String {
        format!("{} {}", format_amount(token.amount), self.text(&token.symbol))
    }

    fn links(&self, event: &StructuredEvent) -> String {
        match self.format {
            MessageFormat::Html => {
                let anchors: Vec<String> = event
                    .links
                    .iter()
                    .map(|link| format!("<a href=\"{}\">{}</a>", html::escape(&link.url), link.label))
                    .collect();
                format!("🔗 {}", anchors.join(" | "))
            }
            MessageFormat::PlainText => event
                .links
                .iter()
                .map(|link| format!("🔗 {}: {}", link.label, link.url))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
