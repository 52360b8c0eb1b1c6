use crate::config::{Difficulty, MiningStrategy};
use crate::error::{LedgerError, Result};
use crate::pow::{self, is_valid_proof, nonce_range, NonceSearch};
use crate::BlockCandidate;
use rayon::prelude::*;
use tracing::debug;

/// Searches nonces in parallel until a hash has at least `difficulty` leading
/// zero hex digits. Whichever worker finds a proof first wins; the others stop.
/// On success the candidate holds the winning proof and hash.
pub fn mine_parallel(
    candidate: &mut BlockCandidate,
    difficulty: Difficulty,
    max_attempts: Option<u64>,
) -> Result<u64> {
    let search = NonceSearch::new(candidate);
    let found = nonce_range(max_attempts)
        .into_par_iter()
        .find_any(|nonce| is_valid_proof(&search.hash_at(*nonce), difficulty));

    let Some(nonce) = found else {
        return Err(LedgerError::MiningExhausted {
            index: candidate.index(),
            attempts: max_attempts.unwrap_or(u64::MAX),
        });
    };

    debug!("parallel search settled on nonce {}", nonce);
    candidate.set_proof(nonce, search.hash_at(nonce));
    Ok(nonce)
}

/// Seal `candidate` under `strategy`.
pub fn mine_with(
    strategy: MiningStrategy,
    candidate: &mut BlockCandidate,
    difficulty: Difficulty,
    max_attempts: Option<u64>,
) -> Result<u64> {
    match strategy {
        MiningStrategy::Sequential => pow::mine(candidate, difficulty, max_attempts),
        MiningStrategy::Parallel => mine_parallel(candidate, difficulty, max_attempts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::count_leading_zero_nibbles;

    #[test]
    fn parallel_finds_valid_proof() {
        let mut candidate = BlockCandidate::new(1, 1_600_000_000, "parallel");
        let difficulty = Difficulty::new(3).unwrap();
        let nonce = mine_parallel(&mut candidate, difficulty, None).unwrap();
        assert_eq!(candidate.proof(), nonce);
        assert!(count_leading_zero_nibbles(candidate.hash()) >= 3);
        assert_eq!(candidate.hash(), &candidate.preimage().digest());
    }

    #[test]
    fn parallel_respects_cap() {
        let mut candidate = BlockCandidate::new(2, 1_600_000_000, "capped");
        let err = mine_parallel(&mut candidate, Difficulty::MAX, Some(1_000)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MiningExhausted {
                index: 2,
                attempts: 1_000
            }
        ));
        assert_eq!(candidate.proof(), 0);
    }

    #[test]
    fn zero_attempts_exhaust_both_strategies() {
        for strategy in [MiningStrategy::Sequential, MiningStrategy::Parallel] {
            let mut candidate = BlockCandidate::new(3, 1_600_000_000, "none");
            let err = mine_with(strategy, &mut candidate, Difficulty::ZERO, Some(0)).unwrap_err();
            assert!(matches!(
                err,
                LedgerError::MiningExhausted {
                    index: 3,
                    attempts: 0
                }
            ));
        }
    }

    #[test]
    fn strategies_agree_on_validity() {
        let difficulty = Difficulty::new(2).unwrap();
        for strategy in [MiningStrategy::Sequential, MiningStrategy::Parallel] {
            let mut candidate = BlockCandidate::new(5, 1_600_000_000, "either");
            mine_with(strategy, &mut candidate, difficulty, None).unwrap();
            assert!(hex::encode(candidate.hash()).starts_with("00"));
        }
    }
}
