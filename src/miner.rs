//! Bounded proof-of-work search.
//!
//! The nonce counter starts at 0 and increments until the sealed digest has
//! at least `difficulty_target` leading zero hex symbols, or until
//! `max_attempts` nonces have been tried.

use serde_json::Value;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::error::{LedgerError, LedgerResult};
use crate::hasher::{meets_difficulty, BlockHasher, DigestInput};
use crate::model::Block;

/// Default attempt bound: 16^6, enough for difficulty 6 on average.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 1 << 24;

/// Attempts between trace progress lines.
const PROGRESS_INTERVAL: u64 = 1 << 20;

#[derive(Debug, Clone, Copy)]
pub struct Miner {
    max_attempts: u64,
}

impl Miner {
    pub fn new(max_attempts: u64) -> Self {
        Self { max_attempts }
    }

    /// Search for a block extending `prev` that meets `difficulty_target`.
    ///
    /// The timestamp is captured once per call; a retry after
    /// [`LedgerError::MiningExhausted`] gets a fresh one.
    pub fn mine(
        &self,
        prev: &Block,
        payload: Value,
        difficulty_target: u32,
        clock: &dyn Clock,
    ) -> LedgerResult<Block> {
        let position = prev.position + 1;
        let timestamp = clock.now();
        let hasher = BlockHasher::new(&DigestInput {
            position,
            timestamp: &timestamp,
            payload: &payload,
            prev_digest: &prev.digest,
            difficulty_target,
            nonce: None,
        });

        for nonce in 0..self.max_attempts {
            let digest = hasher.finish(Some(nonce));
            if meets_difficulty(&digest, difficulty_target) {
                debug!(position, nonce, attempts = nonce + 1, %digest, "work done");
                let block = Block {
                    position,
                    payload,
                    timestamp,
                    prev_digest: prev.digest.clone(),
                    difficulty_target,
                    nonce: Some(nonce),
                    digest,
                };
                debug_assert!(block.verify());
                return Ok(block);
            }
            if nonce > 0 && nonce % PROGRESS_INTERVAL == 0 {
                trace!(position, attempts = nonce, "still mining");
            }
        }

        Err(LedgerError::MiningExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::validation::is_valid_extension;
    use serde_json::json;

    fn genesis() -> Block {
        Block::genesis("2024-01-01T00:00:00Z".into())
    }

    #[test]
    fn test_mine_difficulty_two() {
        let g = genesis();
        let clock = FixedClock::new("2024-01-01T00:00:05Z");
        let b = Miner::default().mine(&g, json!("Y"), 2, &clock).unwrap();

        assert!(b.digest.starts_with("00"));
        assert_eq!(b.position, 1);
        assert_eq!(b.prev_digest, g.digest);
        assert!(b.verify());
        assert!(is_valid_extension(&g, &b));
    }

    #[test]
    fn test_mine_finds_first_satisfying_nonce() {
        let g = genesis();
        let clock = FixedClock::new("t");
        let b = Miner::default().mine(&g, json!({"n": 1}), 1, &clock).unwrap();
        let nonce = b.nonce.unwrap();

        for earlier in 0..nonce {
            let trial = Block::seal(1, json!({"n": 1}), "t".into(), g.digest.clone(), 1, Some(earlier));
            assert!(!trial.digest.starts_with('0'));
        }
    }

    #[test]
    fn test_mine_zero_difficulty_takes_first_nonce() {
        let g = genesis();
        let b = Miner::default()
            .mine(&g, json!(1), 0, &FixedClock::new("t"))
            .unwrap();
        assert_eq!(b.nonce, Some(0));
    }

    #[test]
    fn test_mine_is_deterministic_for_fixed_clock() {
        let g = genesis();
        let clock = FixedClock::new("t");
        let a = Miner::default().mine(&g, json!("p"), 1, &clock).unwrap();
        let b = Miner::default().mine(&g, json!("p"), 1, &clock).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mining_exhausted() {
        let g = genesis();
        let err = Miner::new(4)
            .mine(&g, json!("p"), 64, &FixedClock::new("t"))
            .unwrap_err();
        assert_eq!(err, LedgerError::MiningExhausted { attempts: 4 });
    }

    mod proptest_miner {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            /// Mined blocks meet their target and extend the predecessor.
            #[test]
            fn prop_mined_block_meets_difficulty(
                difficulty in 0u32..=2,
                payload in ".{0,16}",
                position in 0u64..1_000,
                timestamp in "[0-9T:Z-]{1,24}",
            ) {
                let prev = Block::seal(position, json!("prev"), "t".into(), String::new(), 0, None);
                let b = Miner::default()
                    .mine(&prev, json!(payload), difficulty, &FixedClock::new(timestamp))
                    .unwrap();

                prop_assert!(meets_difficulty(&b.digest, difficulty));
                prop_assert_eq!(b.difficulty_target, difficulty);
                prop_assert!(b.verify());
                prop_assert!(is_valid_extension(&prev, &b));
            }
        }
    }
}
