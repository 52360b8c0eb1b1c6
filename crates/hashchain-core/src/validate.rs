//! Chain walks. Integrity checks are always run; proof-of-work is only
//! re-checked under [`ValidationPolicy::Strict`], since a chain's blocks may
//! have been sealed under a different difficulty than the one checked now.
//!
//! [`check_structure`] covers what a chain built by appending guarantees by
//! construction: a genesis block at index 0 and `blocks[i].index == i`.
//! Anything adopted from outside goes through it before it becomes a chain.

use crate::config::Difficulty;
use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::error::ValidationError;
use crate::pow::{count_leading_zero_nibbles, is_valid_proof};
use crate::Block;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Each non-genesis block hashes to its stored hash and links to its parent.
    #[default]
    Integrity,
    /// Integrity, plus every non-genesis hash meeting the difficulty.
    Strict,
}

/// Walk `blocks` from position 1 and report the first failure. Genesis is
/// exempt from the hash, link and work checks.
pub fn verify_blocks(
    blocks: &[Block],
    difficulty: Difficulty,
    policy: ValidationPolicy,
) -> Result<(), ValidationError> {
    let result = walk(blocks, difficulty, policy);
    if let Err(err) = &result {
        warn!("chain verification failed: {}", err);
    }
    result
}

pub fn is_chain_valid(blocks: &[Block], difficulty: Difficulty, policy: ValidationPolicy) -> bool {
    verify_blocks(blocks, difficulty, policy).is_ok()
}

/// Genesis shape and index sequence. An empty slice passes; callers that need
/// a genesis block reject emptiness themselves.
pub fn check_structure(blocks: &[Block]) -> Result<(), ValidationError> {
    let Some(genesis) = blocks.first() else {
        return Ok(());
    };
    if genesis.index != 0 || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(ValidationError::NotGenesis {
            found: genesis.index,
            previous_hash: genesis.previous_hash,
        });
    }
    for (index, block) in blocks.iter().enumerate().skip(1) {
        if block.index != index as u64 {
            return Err(ValidationError::IndexOutOfSequence {
                index,
                found: block.index,
            });
        }
    }
    Ok(())
}

fn walk(
    blocks: &[Block],
    difficulty: Difficulty,
    policy: ValidationPolicy,
) -> Result<(), ValidationError> {
    let strict = policy == ValidationPolicy::Strict;

    for (offset, pair) in blocks.windows(2).enumerate() {
        let (parent, block) = (&pair[0], &pair[1]);
        let index = offset + 1;

        if !block.has_consistent_hash() {
            return Err(ValidationError::HashMismatch { index });
        }
        if block.previous_hash != parent.hash {
            return Err(ValidationError::LinkMismatch { index });
        }
        if strict && !is_valid_proof(&block.hash, difficulty) {
            return Err(ValidationError::InsufficientWork {
                index,
                found: count_leading_zero_nibbles(&block.hash),
                required: difficulty.get(),
            });
        }
    }
    Ok(())
}
