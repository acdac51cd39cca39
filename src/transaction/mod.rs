pub mod balance;
pub mod types;

pub use balance::{BalanceChange, BalanceDiff, NativeBalanceChange};
pub use types::{
    AccountKey, InnerInstructions, Instruction, Message, RawTransaction, TokenBalance,
    TransactionEnvelope, TransactionMeta, UiTokenAmount,
};
