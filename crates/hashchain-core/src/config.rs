//! Chain-wide settings, fixed when a [`Chain`](crate::chain::Chain) is built.

use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::{LedgerError, Result};
use crate::validate::ValidationPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of leading `'0'` hex digits a mined block hash must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    pub const ZERO: Difficulty = Difficulty(0);
    pub const MAX: Difficulty = Difficulty(MAX_DIFFICULTY);

    pub fn new(zeros: u32) -> Result<Self> {
        if zeros > MAX_DIFFICULTY {
            return Err(LedgerError::DifficultyOutOfRange {
                requested: zeros,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(Self(zeros))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_DIFFICULTY)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = LedgerError;

    fn try_from(zeros: u32) -> Result<Self> {
        Self::new(zeros)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> u32 {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    /// Linear search from nonce 0; always finds the smallest valid nonce.
    #[default]
    Sequential,
    /// Nonce space split across the rayon pool; any valid nonce may win.
    Parallel,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    pub difficulty: Difficulty,
    pub strategy: MiningStrategy,
    /// Cap on nonces tried per block. `None` searches until a proof is found.
    pub max_attempts: Option<u64>,
    pub validation: ValidationPolicy,
}

impl ChainConfig {
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_bounds() {
        assert_eq!(Difficulty::new(0).unwrap(), Difficulty::ZERO);
        assert_eq!(Difficulty::new(64).unwrap(), Difficulty::MAX);
        assert!(matches!(
            Difficulty::new(65),
            Err(LedgerError::DifficultyOutOfRange {
                requested: 65,
                max: 64
            })
        ));
    }

    #[test]
    fn default_config() {
        let config = ChainConfig::default();
        assert_eq!(config.difficulty.get(), 2);
        assert_eq!(config.strategy, MiningStrategy::Sequential);
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.validation, ValidationPolicy::Integrity);
    }

    #[test]
    fn config_from_partial_json() {
        let config = ChainConfig::from_json(r#"{"difficulty":3,"strategy":"parallel"}"#).unwrap();
        assert_eq!(config.difficulty.get(), 3);
        assert_eq!(config.strategy, MiningStrategy::Parallel);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn config_rejects_bad_difficulty() {
        let err = ChainConfig::from_json(r#"{"difficulty":65}"#).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(ChainConfig::from_json(r#"{"difficulty":1,"retarget":true}"#).is_err());
    }

    #[test]
    fn config_json_roundtrip_shape() {
        let config = ChainConfig {
            difficulty: Difficulty::new(4).unwrap(),
            strategy: MiningStrategy::Sequential,
            max_attempts: Some(1_000),
            validation: ValidationPolicy::Strict,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"difficulty":4,"strategy":"sequential","max_attempts":1000,"validation":"strict"}"#
        );
    }
}
