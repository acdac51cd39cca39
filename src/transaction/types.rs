use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const SOL_DECIMALS: u8 = 9;

/// Fetched detail record for one transaction, in the `jsonParsed` shape the
/// RPC `getTransaction` call and raw webhook providers both produce.
///
/// Every collection tolerates being absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    pub slot: u64,
    pub block_time: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: TransactionMeta,
    #[serde(deserialize_with = "null_as_default")]
    pub transaction: TransactionEnvelope,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionMeta {
    pub err: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub fee: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub pre_balances: Vec<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub post_balances: Vec<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(deserialize_with = "null_as_default")]
    pub post_token_balances: Vec<TokenBalance>,
    #[serde(deserialize_with = "null_as_default")]
    pub inner_instructions: Vec<InnerInstructions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenBalance {
    pub account_index: u32,
    pub mint: String,
    pub owner: Option<String>,
    pub program_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub ui_token_amount: UiTokenAmount,
}

/// Raw amount is an unsigned integer string in base units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
}

impl UiTokenAmount {
    pub fn raw(&self) -> Option<u128> {
        self.amount.trim().parse::<u128>().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InnerInstructions {
    pub index: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionEnvelope {
    #[serde(deserialize_with = "null_as_default")]
    pub signatures: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub message: Message,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    #[serde(deserialize_with = "null_as_default")]
    pub account_keys: Vec<AccountKey>,
    #[serde(deserialize_with = "null_as_default")]
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "AccountKeyRepr")]
pub struct AccountKey {
    pub pubkey: String,
    pub signer: bool,
    pub writable: bool,
}

// jsonParsed gives objects, plain json encoding gives bare strings
#[derive(Deserialize)]
#[serde(untagged)]
enum AccountKeyRepr {
    Plain(String),
    Parsed {
        pubkey: String,
        #[serde(default)]
        signer: bool,
        #[serde(default)]
        writable: bool,
    },
}

impl From<AccountKeyRepr> for AccountKey {
    fn from(repr: AccountKeyRepr) -> Self {
        match repr {
            AccountKeyRepr::Plain(pubkey) => Self {
                pubkey,
                signer: false,
                writable: false,
            },
            AccountKeyRepr::Parsed {
                pubkey,
                signer,
                writable,
            } => Self {
                pubkey,
                signer,
                writable,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instruction {
    pub program_id: String,
    pub program: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub accounts: Vec<String>,
    /// Base58 instruction data, present when the provider could not decode it.
    pub data: Option<String>,
    /// Provider-decoded form, usually `{"type": ..., "info": {...}}`.
    pub parsed: Option<Value>,
}

impl Instruction {
    pub fn parsed_type(&self) -> Option<&str> {
        self.parsed.as_ref()?.get("type")?.as_str()
    }

    pub fn parsed_info(&self) -> Option<&Value> {
        self.parsed.as_ref()?.get("info")
    }

    /// Decoded instruction bytes; `None` when the data is missing or not base58.
    pub fn data_bytes(&self) -> Option<Vec<u8>> {
        bs58::decode(self.data.as_ref()?).into_vec().ok()
    }
}

impl RawTransaction {
    pub fn signature(&self) -> Option<&str> {
        self.transaction.signatures.first().map(String::as_str)
    }

    pub fn account_key(&self, index: usize) -> Option<&str> {
        self.transaction
            .message
            .account_keys
            .get(index)
            .map(|k| k.pubkey.as_str())
    }

    pub fn fee_payer(&self) -> Option<&str> {
        self.account_key(0)
    }

    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        self.block_time
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    pub fn is_success(&self) -> bool {
        self.meta.err.is_none()
    }

    /// Outer instructions in order, followed by every inner instruction in order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.transaction.message.instructions.iter().chain(
            self.meta
                .inner_instructions
                .iter()
                .flat_map(|inner| inner.instructions.iter()),
        )
    }

    pub fn invokes(&self, program_id: &str) -> bool {
        self.instructions().any(|ix| ix.program_id == program_id)
    }

    pub fn has_payload(&self) -> bool {
        !self.transaction.signatures.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
