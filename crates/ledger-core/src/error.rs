use thiserror::Error;

/// Why a block or chain failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("expected index {expected}, found {found}")]
    IndexGap { expected: u64, found: u64 },

    #[error("previous hash {found} does not match predecessor hash {expected}")]
    PreviousHashMismatch { expected: String, found: String },

    #[error("stored hash {stored} does not match recomputed hash {computed}")]
    HashMismatch { stored: String, computed: String },

    #[error("hash has {zeros} leading zeros, difficulty requires {difficulty}")]
    InsufficientWork { difficulty: u32, zeros: u32 },

    #[error("block {index} carries a malformed transaction: {reason}")]
    MalformedTransaction { index: u64, reason: String },
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("invalid miner address: {0:?}")]
    InvalidMiner(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("mining abandoned: the chain tip moved while searching")]
    MiningSuperseded,

    #[error("block rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),

    #[error("persisted chain is corrupt: {0}")]
    CorruptStore(ValidationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err)
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
