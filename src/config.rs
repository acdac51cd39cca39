use std::env;
use std::str::FromStr;

use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tokio::time::Duration;

use crate::classifier::registry::{ClassifierContext, DustThresholds};
use crate::fetch::fetcher::FetcherConfig;
use crate::monitor::dedup::DEFAULT_CEILING;
use crate::monitor::poller::PollerConfig;
use crate::retry::RetryConfig;
use crate::solana_config::{SolanaConfig, MAINNET_RPC_URL};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(String),

    #[error("{key}: invalid value {value:?} ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// An address or program id with an optional display name, from `id=Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedKey {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramSettings {
    pub token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub solana: SolanaConfig,
    pub watch_addresses: Vec<NamedKey>,
    pub poll_interval: Duration,
    pub poll_signature_limit: usize,
    pub fetcher: FetcherConfig,
    pub notify_retry: RetryConfig,
    pub dedup_ceiling: usize,
    pub telegram: Option<TelegramSettings>,
    pub feishu_webhook_url: Option<String>,
    pub dex_programs: Vec<NamedKey>,
    pub pool_programs: Vec<NamedKey>,
    pub dust: DustThresholds,
    pub enable_polling: bool,
    pub enable_webhook: bool,
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let solana = SolanaConfig::custom(
            vars.get("SOLANA_RPC_URL")
                .unwrap_or_else(|| MAINNET_RPC_URL.to_string()),
            vars.commitment("SOLANA_COMMITMENT")?,
        );

        let fetcher = FetcherConfig {
            concurrency: vars.number("CONCURRENCY", 3usize)?.max(1),
            min_interval: Duration::from_millis(vars.number("RATE_LIMIT", 120u64)?),
            retry: RetryConfig::linear(
                vars.number("FETCH_MAX_ATTEMPTS", 3u32)?,
                Duration::from_millis(vars.number("FETCH_RETRY_DELAY_MS", 1000u64)?),
            ),
            cache_ttl: match vars.number("FETCH_CACHE_TTL_SECS", 3600u64)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            cache_capacity: vars.number("FETCH_CACHE_CAPACITY", 1000usize)?,
        };

        let telegram = if vars.flag("ENABLE_TELEGRAM", true)? {
            Some(TelegramSettings {
                token: vars.required("TELEGRAM_TOKEN")?,
                chat_id: vars.required("TELEGRAM_CHAT_ID")?,
            })
        } else {
            None
        };
        let feishu_webhook_url = if vars.flag("ENABLE_FEISHU", false)? {
            Some(vars.required("FEISHU_WEBHOOK_URL")?)
        } else {
            None
        };

        Ok(Self {
            solana,
            watch_addresses: vars.named_keys("WATCH_ADDRESSES")?,
            poll_interval: Duration::from_millis(vars.number("POLL_INTERVAL", 1500u64)?),
            poll_signature_limit: vars.number("POLL_SIGNATURE_LIMIT", 10usize)?,
            fetcher,
            notify_retry: RetryConfig::linear(
                vars.number("NOTIFY_MAX_ATTEMPTS", 3u32)?,
                Duration::from_millis(vars.number("NOTIFY_RETRY_DELAY_MS", 1000u64)?),
            ),
            dedup_ceiling: vars.number("DEDUP_CEILING", DEFAULT_CEILING)?,
            telegram,
            feishu_webhook_url,
            dex_programs: vars.named_keys("DEX_PROGRAMS")?,
            pool_programs: vars.named_keys("POOL_PROGRAMS")?,
            dust: DustThresholds {
                sol_lamports: vars.number("SOL_DUST_LAMPORTS", 0u64)?,
                token_units: vars.number("TOKEN_DUST_UNITS", 1u128)?,
            },
            enable_polling: vars.flag("ENABLE_POLLING", true)?,
            enable_webhook: vars.flag("ENABLE_WEBHOOK", true)?,
            port: vars.number("PORT", 3000u16)?,
        })
    }

    /// Built-in registries plus configured programs and watched wallets.
    pub fn classifier_context(&self) -> ClassifierContext {
        let mut context = ClassifierContext::with_defaults();
        for program in &self.dex_programs {
            context.programs.add_dex(&program.id, program.name.as_deref());
        }
        for program in &self.pool_programs {
            context.programs.add_pool(&program.id, program.name.as_deref());
        }
        for wallet in &self.watch_addresses {
            context.wallets.insert(&wallet.id, wallet.name.as_deref());
        }
        context.dust = self.dust;
        context
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            addresses: self.watch_addresses.iter().map(|a| a.id.clone()).collect(),
            interval: self.poll_interval,
            signature_limit: self.poll_signature_limit,
        }
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn number<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match self.get(key) {
            Some(value) => value
                .parse::<T>()
                .map_err(|e| ConfigError::invalid(key, &value, e)),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, &value, "expected true or false")),
        }
    }

    fn commitment(&self, key: &str) -> Result<CommitmentConfig, ConfigError> {
        match self.get(key) {
            Some(value) => CommitmentLevel::from_str(&value)
                .map(|commitment| CommitmentConfig { commitment })
                .map_err(|e| ConfigError::invalid(key, &value, e)),
            None => Ok(CommitmentConfig::confirmed()),
        }
    }

    // Comma list of `id` or `id=Display Name`; every id must be a pubkey.
    fn named_keys(&self, key: &str) -> Result<Vec<NamedKey>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };

        let mut keys = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, name) = match entry.split_once('=') {
                Some((id, name)) => (id.trim(), Some(name.trim())),
                None => (entry, None),
            };
            Pubkey::from_str(id).map_err(|e| ConfigError::invalid(key, id, e))?;
            keys.push(NamedKey {
                id: id.to_string(),
                name: name.filter(|n| !n.is_empty()).map(str::to_string),
            });
        }
        Ok(keys)
    }
}
