//! Append-only, hash-linked ledger sealed by proof-of-work.
//!
//! A [`chain::Chain`] owns an ordered run of [`Block`]s rooted at an unmined
//! genesis block. New blocks enter only through [`chain::Chain::append`], which
//! links the candidate to the tip and mines it under the chain's difficulty.

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;
pub mod validate;

pub use chain::{genesis_block, Chain, ChainRecord};
pub use config::{ChainConfig, Difficulty, MiningStrategy};
pub use error::{LedgerError, Result, ValidationError};
pub use validate::{check_structure, verify_blocks, ValidationPolicy};

use constants::{GENESIS_PREVIOUS_HASH, HASH_SIZE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub type Hash = [u8; HASH_SIZE];

/// Seconds since the Unix epoch, or 0 if the clock sits before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn finish(hasher: Sha256) -> Hash {
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

/// Borrowed view of the five hashed fields.
///
/// Canonical byte layout, integers little-endian:
///
/// ```text
/// index u64 | previous_hash [u8; 32] | timestamp u64 | data_len u64 | data | proof u64
/// ```
///
/// `proof` goes last so a miner can hash the prefix once and feed only the nonce.
#[derive(Clone, Copy, Debug)]
pub struct Preimage<'a> {
    pub index: u64,
    pub previous_hash: &'a Hash,
    pub timestamp: u64,
    pub data: &'a [u8],
    pub proof: u64,
}

impl Preimage<'_> {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + HASH_SIZE + 8 + 8 + self.data.len() + 8);
        self.write_prefix(&mut bytes);
        bytes.extend_from_slice(&self.proof.to_le_bytes());
        bytes
    }

    pub fn digest(&self) -> Hash {
        let mut hasher = self.prefix_hasher();
        hasher.update(self.proof.to_le_bytes());
        finish(hasher)
    }

    /// Hasher already fed with every field except `proof`.
    pub fn prefix_hasher(&self) -> Sha256 {
        let mut prefix = Vec::with_capacity(8 + HASH_SIZE + 8 + 8 + self.data.len());
        self.write_prefix(&mut prefix);
        let mut hasher = Sha256::new();
        hasher.update(&prefix);
        hasher
    }

    fn write_prefix(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(self.previous_hash);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(self.data.len() as u64).to_le_bytes());
        bytes.extend_from_slice(self.data);
    }
}

/// A block under construction. Only the mining routine moves its nonce, and
/// [`BlockCandidate::seal`] turns it into an immutable [`Block`].
#[derive(Clone, Debug)]
pub struct BlockCandidate {
    index: u64,
    previous_hash: Hash,
    timestamp: u64,
    data: Vec<u8>,
    proof: u64,
    hash: Hash,
}

impl BlockCandidate {
    /// The hash computed here is provisional: proof is 0 and the parent link
    /// is the sentinel until the chain sets it.
    pub fn new(index: u64, timestamp: u64, data: impl Into<Vec<u8>>) -> Self {
        let mut candidate = Self {
            index,
            previous_hash: GENESIS_PREVIOUS_HASH,
            timestamp,
            data: data.into(),
            proof: 0,
            hash: [0u8; HASH_SIZE],
        };
        candidate.hash = candidate.preimage().digest();
        candidate
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn proof(&self) -> u64 {
        self.proof
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn preimage(&self) -> Preimage<'_> {
        Preimage {
            index: self.index,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            data: &self.data,
            proof: self.proof,
        }
    }

    /// Point the candidate at its parent and restart the nonce at 0.
    pub(crate) fn link_to(&mut self, previous_hash: Hash) {
        self.previous_hash = previous_hash;
        self.proof = 0;
        self.hash = self.preimage().digest();
    }

    pub(crate) fn set_proof(&mut self, proof: u64, hash: Hash) {
        self.proof = proof;
        self.hash = hash;
    }

    pub(crate) fn seal(self) -> Block {
        Block {
            index: self.index,
            previous_hash: self.previous_hash,
            timestamp: self.timestamp,
            data: self.data,
            proof: self.proof,
            hash: self.hash,
        }
    }
}

/// A sealed ledger record. Fields are readable from outside the crate but
/// never writable, so a block cannot drift from its stored hash after sealing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) index: u64,
    #[serde(with = "hex::serde")]
    pub(crate) previous_hash: Hash,
    pub(crate) timestamp: u64,
    #[serde(with = "hex::serde")]
    pub(crate) data: Vec<u8>,
    pub(crate) proof: u64,
    #[serde(with = "hex::serde")]
    pub(crate) hash: Hash,
}

impl Block {
    /// Build a block from explicit fields, hashing them on the spot. No work is
    /// performed; such a block reaches a chain only through validated import.
    pub fn new(
        index: u64,
        previous_hash: Hash,
        timestamp: u64,
        data: impl Into<Vec<u8>>,
        proof: u64,
    ) -> Self {
        let mut block = Self {
            index,
            previous_hash,
            timestamp,
            data: data.into(),
            proof,
            hash: [0u8; HASH_SIZE],
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn proof(&self) -> u64 {
        self.proof
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn previous_hash_hex(&self) -> String {
        hex::encode(self.previous_hash)
    }

    /// Payload rendered as text, with invalid UTF-8 replaced.
    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn preimage(&self) -> Preimage<'_> {
        Preimage {
            index: self.index,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            data: &self.data,
            proof: self.proof,
        }
    }

    /// Recompute the hash from the current fields. Pure.
    pub fn compute_hash(&self) -> Hash {
        self.preimage().digest()
    }

    pub fn has_consistent_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }
}

pub mod pow {
    use super::{finish, BlockCandidate, Hash};
    use crate::config::Difficulty;
    use crate::error::{LedgerError, Result};
    use sha2::{Digest, Sha256};
    use std::ops::RangeInclusive;
    use tracing::debug;

    /// Leading zero hex digits of `hash`, i.e. the count of leading `'0'`
    /// characters in its lowercase hex form.
    pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
        let mut total = 0u32;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    pub fn is_valid_proof(hash: &Hash, difficulty: Difficulty) -> bool {
        count_leading_zero_nibbles(hash) >= difficulty.get()
    }

    /// Nonces a search may try: the first `max_attempts` of them, or all of
    /// `u64` when uncapped.
    pub fn nonce_range(max_attempts: Option<u64>) -> RangeInclusive<u64> {
        match max_attempts {
            None => 0..=u64::MAX,
            Some(attempts) => match attempts.checked_sub(1) {
                Some(last) => 0..=last,
                // 1..=0 is empty
                None => 1..=0,
            },
        }
    }

    /// Lazy sequence of `(nonce, hash)` pairs for one candidate, nonce 0 upward.
    pub struct NonceSearch {
        prefix: Sha256,
        nonces: RangeInclusive<u64>,
    }

    impl NonceSearch {
        pub fn new(candidate: &BlockCandidate) -> Self {
            Self {
                prefix: candidate.preimage().prefix_hasher(),
                nonces: nonce_range(None),
            }
        }

        /// Stop after `attempts` nonces.
        pub fn capped(candidate: &BlockCandidate, attempts: u64) -> Self {
            Self {
                prefix: candidate.preimage().prefix_hasher(),
                nonces: nonce_range(Some(attempts)),
            }
        }

        pub fn hash_at(&self, nonce: u64) -> Hash {
            let mut hasher = self.prefix.clone();
            hasher.update(nonce.to_le_bytes());
            finish(hasher)
        }
    }

    impl Iterator for NonceSearch {
        type Item = (u64, Hash);

        fn next(&mut self) -> Option<Self::Item> {
            let nonce = self.nonces.next()?;
            Some((nonce, self.hash_at(nonce)))
        }
    }

    /// Linear search for the smallest nonce satisfying `difficulty`. On success
    /// the candidate holds the winning proof and hash.
    pub fn mine(
        candidate: &mut BlockCandidate,
        difficulty: Difficulty,
        max_attempts: Option<u64>,
    ) -> Result<u64> {
        let search = match max_attempts {
            Some(cap) => NonceSearch::capped(candidate, cap),
            None => NonceSearch::new(candidate),
        };
        let mut tried = 0u64;
        for (nonce, hash) in search {
            tried = tried.saturating_add(1);
            if is_valid_proof(&hash, difficulty) {
                debug!("nonce {} found after {} attempts", nonce, tried);
                candidate.set_proof(nonce, hash);
                return Ok(nonce);
            }
        }
        Err(LedgerError::MiningExhausted {
            index: candidate.index(),
            attempts: tried,
        })
    }
}
