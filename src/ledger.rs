//! The shared chain and its append/commit protocol.
//!
//! Blocks live in a `RwLock<Vec<Block>>`. Commits take the write lock only
//! for validate-and-push, so readers always see either the chain before a
//! commit or after it. Appenders additionally serialize on `append_lock`
//! under [`AppendStrategy::Serialized`]; under
//! [`AppendStrategy::Optimistic`] they mine lock-free and rely on the
//! commit-time tip check.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{AppendStrategy, LedgerConfig};
use crate::error::{ExtensionError, LedgerError, LedgerResult};
use crate::miner::Miner;
use crate::model::Block;
use crate::validation::{audit_chain, check_extension};

/// Result of [`Ledger::audit`]; `errors` is empty when the chain is healthy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub length: usize,
    pub errors: Vec<String>,
}

impl AuditReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Ledger {
    /// Never empty: index 0 is genesis.
    chain: RwLock<Vec<Block>>,
    append_lock: Mutex<()>,
    config: LedgerConfig,
    miner: Miner,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        let genesis = Block::genesis(clock.now());
        info!(digest = %genesis.digest, difficulty = config.difficulty, "genesis block created");
        Self {
            chain: RwLock::new(vec![genesis]),
            append_lock: Mutex::new(()),
            miner: Miner::new(config.max_attempts),
            config,
            clock,
        }
    }

    pub fn difficulty(&self) -> u32 {
        self.config.difficulty
    }

    /// Point-in-time copy of the whole chain.
    pub fn snapshot(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    pub fn tip(&self) -> Block {
        let chain = self.chain.read();
        chain[chain.len() - 1].clone()
    }

    /// Number of committed blocks, genesis included.
    pub fn block_count(&self) -> usize {
        self.chain.read().len()
    }

    pub fn get(&self, position: u64) -> Option<Block> {
        let index = usize::try_from(position).ok()?;
        self.chain.read().get(index).cloned()
    }

    /// Re-validate the entire chain under a single read lock.
    pub fn audit(&self) -> AuditReport {
        let chain = self.chain.read();
        AuditReport {
            length: chain.len(),
            errors: audit_chain(&chain),
        }
    }

    /// Mine (or seal) a block carrying `payload` and commit it as the new tip.
    pub fn append(&self, payload: Value) -> LedgerResult<Block> {
        if payload.is_null() {
            return Err(LedgerError::MalformedInput("payload is null".into()));
        }

        match self.config.strategy {
            AppendStrategy::Serialized => {
                let _guard = self.append_lock.lock();
                let tip = self.tip();
                let candidate = self.produce(&tip, payload)?;
                self.commit(candidate, Some(&tip.digest))
            }
            AppendStrategy::Optimistic { max_retries } => {
                self.append_optimistic(payload, max_retries)
            }
        }
    }

    fn append_optimistic(&self, payload: Value, max_retries: u32) -> LedgerResult<Block> {
        let mut retries = 0;
        loop {
            let tip = self.tip();
            let candidate = self.produce(&tip, payload.clone())?;
            match self.commit(candidate, Some(&tip.digest)) {
                Err(LedgerError::InvalidExtension {
                    reason: ExtensionError::StaleTip { tip_position },
                    ..
                }) if retries < max_retries => {
                    retries += 1;
                    warn!(
                        mined_against = tip.position,
                        tip_position, retries, "tip advanced while mining, retrying"
                    );
                }
                result => return result,
            }
        }
    }

    /// Commit a block built elsewhere, after validating it against the tip.
    pub fn submit(&self, candidate: Block) -> LedgerResult<Block> {
        let _guard = match self.config.strategy {
            AppendStrategy::Serialized => Some(self.append_lock.lock()),
            AppendStrategy::Optimistic { .. } => None,
        };
        self.commit(candidate, None)
    }

    fn produce(&self, tip: &Block, payload: Value) -> LedgerResult<Block> {
        if self.config.pow_enabled() {
            self.miner
                .mine(tip, payload, self.config.difficulty, self.clock.as_ref())
        } else {
            Ok(Block::seal(
                tip.position + 1,
                payload,
                self.clock.now(),
                tip.digest.clone(),
                0,
                None,
            ))
        }
    }

    /// Validate against the current tip and push, all under the write lock.
    ///
    /// `mined_against` is the digest of the tip the candidate was produced
    /// from; if the tip has since moved the rejection is `StaleTip`.
    fn commit(&self, candidate: Block, mined_against: Option<&str>) -> LedgerResult<Block> {
        let mut chain = self.chain.write();
        let tip = &chain[chain.len() - 1];

        let checked = match mined_against {
            Some(digest) if digest != tip.digest => Err(ExtensionError::StaleTip {
                tip_position: tip.position,
            }),
            _ if candidate.difficulty_target != self.config.difficulty => {
                Err(ExtensionError::DifficultyMismatch {
                    expected: self.config.difficulty,
                    actual: candidate.difficulty_target,
                })
            }
            _ => check_extension(tip, &candidate),
        };

        if let Err(reason) = checked {
            warn!(position = candidate.position, %reason, "candidate rejected");
            return Err(LedgerError::rejected(candidate.position, reason));
        }

        info!(position = candidate.position, digest = %candidate.digest, "block committed");
        chain.push(candidate.clone());
        Ok(candidate)
    }
}
