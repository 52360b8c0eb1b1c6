use crate::Hash;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("difficulty {requested} exceeds the maximum of {max} leading zero digits")]
    DifficultyOutOfRange { requested: u32, max: u32 },

    #[error("block index {found} does not extend the chain, expected {expected}")]
    IndexMismatch { expected: u64, found: u64 },

    /// The caller-imposed attempt cap ran out before a valid nonce turned up.
    /// The chain is left exactly as it was.
    #[error("no valid proof for block {index} within {attempts} attempts")]
    MiningExhausted { index: u64, attempts: u64 },

    #[error("a chain needs at least a genesis block")]
    EmptyChain,

    #[error("chain tip sits at the last representable index")]
    IndexOverflow,

    #[error("chain failed verification: {0}")]
    Invalid(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// First failure found while walking a chain. `index` is the position in the
/// block sequence.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Genesis must sit at index 0 and point at the all-zero sentinel.
    #[error("block 0 is not a genesis block (index {found}, previous_hash {})", hex::encode(.previous_hash))]
    NotGenesis { found: u64, previous_hash: Hash },

    #[error("block {index}: stored hash does not match its contents")]
    HashMismatch { index: usize },

    #[error("block {index}: previous_hash does not match the hash of its parent")]
    LinkMismatch { index: usize },

    #[error("block at position {index} carries index {found}")]
    IndexOutOfSequence { index: usize, found: u64 },

    #[error("block {index}: hash has {found} leading zero digits, difficulty requires {required}")]
    InsufficientWork {
        index: usize,
        found: u32,
        required: u32,
    },
}

impl ValidationError {
    pub fn index(&self) -> usize {
        match *self {
            ValidationError::NotGenesis { .. } => 0,
            ValidationError::HashMismatch { index }
            | ValidationError::LinkMismatch { index }
            | ValidationError::IndexOutOfSequence { index, .. }
            | ValidationError::InsufficientWork { index, .. } => index,
        }
    }
}
