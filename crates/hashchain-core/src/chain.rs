use crate::config::{ChainConfig, Difficulty};
use crate::constants::{GENESIS_DATA, GENESIS_PREVIOUS_HASH};
use crate::error::{LedgerError, Result, ValidationError};
use crate::mine::mine_with;
use crate::validate::{check_structure, verify_blocks};
use crate::{unix_now, Block, BlockCandidate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Serialized form of a chain. Deserializing into [`Chain`] goes through
/// [`Chain::import`], so a tampered record never becomes a live chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainRecord {
    #[serde(default)]
    pub config: ChainConfig,
    pub blocks: Vec<Block>,
}

/// Ordered, append-only run of blocks. Never empty: genesis sits at index 0.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ChainRecord")]
pub struct Chain {
    config: ChainConfig,
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        let genesis = genesis_block();
        info!(
            "new chain, difficulty {}, genesis {}",
            config.difficulty,
            genesis.hash_hex()
        );
        Self {
            config,
            blocks: vec![genesis],
        }
    }

    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self::new(ChainConfig::with_difficulty(difficulty))
    }

    /// Adopt blocks from elsewhere (an export, a test fixture). Genesis shape
    /// and index sequence are always checked, then the blocks are verified
    /// under `config.validation` before the chain is handed back.
    pub fn import(config: ChainConfig, blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        check_structure(&blocks)?;
        verify_blocks(&blocks, config.difficulty, config.validation)?;
        debug!("imported {} blocks", blocks.len());
        Ok(Self { config, blocks })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    /// Most recently appended block.
    pub fn tip(&self) -> &Block {
        // never empty
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Number of blocks, genesis included. Always at least 1.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn next_index(&self) -> Result<u64> {
        self.tip()
            .index
            .checked_add(1)
            .ok_or(LedgerError::IndexOverflow)
    }

    /// Build a candidate at `index`, mine it and append it. `index` must be
    /// [`Chain::next_index`]; the chain assigns positions, callers only confirm them.
    pub fn append(
        &mut self,
        index: u64,
        timestamp: u64,
        data: impl Into<Vec<u8>>,
    ) -> Result<&Block> {
        self.append_candidate(BlockCandidate::new(index, timestamp, data))
    }

    /// Append `data` at the next index, stamped with the current time.
    pub fn append_data(&mut self, data: impl Into<Vec<u8>>) -> Result<&Block> {
        let index = self.next_index()?;
        self.append(index, unix_now(), data)
    }

    /// Link `candidate` to the tip, overwriting whatever parent it carried,
    /// mine it under the chain's difficulty and push the sealed block. On
    /// error nothing is appended.
    pub fn append_candidate(&mut self, mut candidate: BlockCandidate) -> Result<&Block> {
        let expected = self.next_index()?;
        if candidate.index() != expected {
            return Err(LedgerError::IndexMismatch {
                expected,
                found: candidate.index(),
            });
        }

        candidate.link_to(self.tip().hash);
        debug!(
            "mining block {} at difficulty {} ({:?})",
            expected, self.config.difficulty, self.config.strategy
        );
        let nonce = mine_with(
            self.config.strategy,
            &mut candidate,
            self.config.difficulty,
            self.config.max_attempts,
        )?;

        let block = candidate.seal();
        info!(
            "Mined block {} with nonce {} and hash {}",
            block.index,
            nonce,
            block.hash_hex()
        );
        self.blocks.push(block);
        Ok(self.tip())
    }

    /// First failure under the configured validation policy, if any.
    pub fn verify(&self) -> std::result::Result<(), ValidationError> {
        verify_blocks(&self.blocks, self.config.difficulty, self.config.validation)
    }

    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }

    pub fn to_record(&self) -> ChainRecord {
        ChainRecord {
            config: self.config.clone(),
            blocks: self.blocks.clone(),
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl TryFrom<ChainRecord> for Chain {
    type Error = LedgerError;

    fn try_from(record: ChainRecord) -> Result<Self> {
        Self::import(record.config, record.blocks)
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// The unmined first block, stamped now.
pub fn genesis_block() -> Block {
    genesis_block_at(unix_now())
}

/// Genesis never pays for proof-of-work; its hash need not meet any difficulty.
pub fn genesis_block_at(timestamp: u64) -> Block {
    Block::new(0, GENESIS_PREVIOUS_HASH, timestamp, GENESIS_DATA, 0)
}
