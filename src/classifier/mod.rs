pub mod chain;
pub mod protocols;
pub mod registry;
pub mod types;

pub use chain::{Classification, Classifier, ClassifierChain, Extraction};
pub use registry::{ClassifierContext, DustThresholds, ProgramRegistry, TokenRegistry, WalletBook};
pub use types::{
    AddPoolDetail, DeepLink, EventDetail, EventKind, MintDetail, Participant, StructuredEvent,
    SwapAction, SwapDetail, TokenAmount, TransferAsset, TransferDetail, Venue,
};
