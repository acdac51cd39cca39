use std::collections::HashMap;

use rust_decimal::Decimal;

use super::types::{Participant, TokenAmount, Venue};
use crate::transaction::types::{SOL_DECIMALS, WRAPPED_SOL_MINT};

pub const RAYDIUM_AMM_V4_PROGRAM_ID: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";
pub const RAYDIUM_CPMM_PROGRAM_ID: &str = "CPMMoo8L3F4NbTegBCKVNunggL7H1ZpdTHKxQB5qKP1C";
pub const RAYDIUM_LAUNCHLAB_PROGRAM_ID: &str = "LanMV9sAd7wArD4vJFi2qDdfnVhFxYSUg6eADduJ3uj";
pub const ORCA_PROGRAM_ID: &str = "9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP";
pub const SERUM_SWAP_PROGRAM_ID: &str = "SwaPpA9LAaLfeLi3a68M4DjnLqgtticKg6CnyNwgAC8";
pub const JUPITER_V6_PROGRAM_ID: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
pub const ORCA_WHIRLPOOL_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";
pub const METEORA_DLMM_PROGRAM_ID: &str = "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo";

pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

const DEFAULT_DEX_PROGRAMS: &[(&str, &str)] = &[
    (RAYDIUM_CPMM_PROGRAM_ID, "Raydium CPMM"),
    (RAYDIUM_AMM_V4_PROGRAM_ID, "Raydium AMM"),
    (RAYDIUM_LAUNCHLAB_PROGRAM_ID, "Raydium LaunchLab"),
    (ORCA_PROGRAM_ID, "Orca"),
    (SERUM_SWAP_PROGRAM_ID, "Serum"),
    (JUPITER_V6_PROGRAM_ID, "Jupiter V6"),
    (ORCA_WHIRLPOOL_PROGRAM_ID, "Orca Whirlpool"),
];

const DEFAULT_POOL_PROGRAMS: &[(&str, &str)] = &[
    (RAYDIUM_AMM_V4_PROGRAM_ID, "Raydium AMM"),
    (RAYDIUM_CPMM_PROGRAM_ID, "Raydium CPMM"),
    (ORCA_WHIRLPOOL_PROGRAM_ID, "Orca Whirlpool"),
    (METEORA_DLMM_PROGRAM_ID, "Meteora DLMM"),
];

/// Program ids the classifiers gate on, with display names.
#[derive(Debug, Clone, Default)]
pub struct ProgramRegistry {
    dex: HashMap<String, String>,
    pool: HashMap<String, String>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (id, name) in DEFAULT_DEX_PROGRAMS {
            registry.add_dex(id, Some(name));
        }
        for (id, name) in DEFAULT_POOL_PROGRAMS {
            registry.add_pool(id, Some(name));
        }
        registry
    }

    pub fn add_dex(&mut self, program_id: &str, name: Option<&str>) {
        self.dex.insert(
            program_id.to_string(),
            name.unwrap_or(program_id).to_string(),
        );
    }

    pub fn add_pool(&mut self, program_id: &str, name: Option<&str>) {
        self.pool.insert(
            program_id.to_string(),
            name.unwrap_or(program_id).to_string(),
        );
    }

    pub fn is_dex(&self, program_id: &str) -> bool {
        self.dex.contains_key(program_id)
    }

    pub fn is_pool_program(&self, program_id: &str) -> bool {
        self.pool.contains_key(program_id)
    }

    pub fn dex_venue(&self, program_id: &str) -> Venue {
        Venue {
            program_id: program_id.to_string(),
            name: self.dex.get(program_id).cloned(),
        }
    }

    pub fn pool_venue(&self, program_id: &str) -> Venue {
        Venue {
            program_id: program_id.to_string(),
            name: self.pool.get(program_id).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Symbols for well-known mints. Everything else renders as an abbreviated mint.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    known: HashMap<String, TokenInfo>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        let mut known = HashMap::new();
        for (mint, symbol, decimals) in [
            (WRAPPED_SOL_MINT, "SOL", SOL_DECIMALS),
            (USDC_MINT, "USDC", 6),
            (USDT_MINT, "USDT", 6),
        ] {
            known.insert(
                mint.to_string(),
                TokenInfo {
                    symbol: symbol.to_string(),
                    decimals,
                },
            );
        }
        Self { known }
    }
}

impl TokenRegistry {
    pub fn lookup(&self, mint: &str) -> Option<&TokenInfo> {
        self.known.get(mint)
    }

    pub fn symbol(&self, mint: &str) -> String {
        match self.known.get(mint) {
            Some(info) => info.symbol.clone(),
            None => format!("{}...", mint.chars().take(4).collect::<String>()),
        }
    }

    /// Normalize a raw amount by `decimals`. `None` when it cannot be represented.
    pub fn amount(&self, mint: &str, raw: i128, decimals: u8) -> Option<TokenAmount> {
        let amount = Decimal::try_from_i128_with_scale(raw, decimals as u32).ok()?;
        Some(TokenAmount {
            mint: mint.to_string(),
            symbol: self.symbol(mint),
            decimals,
            amount: amount.normalize(),
        })
    }
}

/// Display names for watched wallets.
#[derive(Debug, Clone, Default)]
pub struct WalletBook {
    labels: HashMap<String, String>,
}

impl WalletBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str, label: Option<&str>) {
        let label = label.unwrap_or(address);
        self.labels.insert(address.to_string(), label.to_string());
    }

    pub fn contains(&self, address: &str) -> bool {
        self.labels.contains_key(address)
    }

    pub fn participant(&self, address: &str) -> Participant {
        Participant {
            address: address.to_string(),
            label: self
                .labels
                .get(address)
                .filter(|label| label.as_str() != address)
                .cloned(),
        }
    }
}

/// Below these amounts a matched transfer is not worth a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DustThresholds {
    /// Native transfers at or below this many lamports are suppressed.
    pub sol_lamports: u64,
    /// Token transfers below this many raw units are suppressed.
    pub token_units: u128,
}

impl Default for DustThresholds {
    fn default() -> Self {
        Self {
            sol_lamports: 0,
            token_units: 1,
        }
    }
}

/// Everything the classifiers read besides the transaction itself.
#[derive(Debug, Clone, Default)]
pub struct ClassifierContext {
    pub programs: ProgramRegistry,
    pub tokens: TokenRegistry,
    pub wallets: WalletBook,
    pub dust: DustThresholds,
}

impl ClassifierContext {
    pub fn with_defaults() -> Self {
        Self {
            programs: ProgramRegistry::with_defaults(),
            ..Default::default()
        }
    }
}
