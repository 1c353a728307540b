//! Chain validation: is a candidate a legal extension of a tip?
//!
//! Checks run in a fixed order and stop at the first failure:
//! position, prev_digest linkage, digest recomputation, then difficulty.

use crate::error::ExtensionError;
use crate::hasher::{leading_zero_symbols, meets_difficulty};
use crate::model::{genesis_payload, Block};

/// Validate `candidate` against `prev`, reporting the first failed check.
pub fn check_extension(prev: &Block, candidate: &Block) -> Result<(), ExtensionError> {
    let expected = prev.position + 1;
    if candidate.position != expected {
        return Err(ExtensionError::PositionMismatch {
            expected,
            actual: candidate.position,
        });
    }

    if candidate.prev_digest != prev.digest {
        return Err(ExtensionError::PrevDigestMismatch {
            expected: prev.digest.clone(),
            actual: candidate.prev_digest.clone(),
        });
    }

    if !candidate.verify() {
        return Err(ExtensionError::DigestMismatch);
    }

    if candidate.difficulty_target > 0
        && !meets_difficulty(&candidate.digest, candidate.difficulty_target)
    {
        return Err(ExtensionError::InsufficientWork {
            required: candidate.difficulty_target,
            actual: leading_zero_symbols(&candidate.digest),
        });
    }

    Ok(())
}

/// Boolean form of [`check_extension`].
pub fn is_valid_extension(prev: &Block, candidate: &Block) -> bool {
    check_extension(prev, candidate).is_ok()
}

/// Re-validate a whole chain. Returns one message per fault found.
pub fn audit_chain(blocks: &[Block]) -> Vec<String> {
    let mut errors = vec![];

    let Some(genesis) = blocks.first() else {
        errors.push("chain is empty".to_string());
        return errors;
    };
    if genesis.position != 0 {
        errors.push(format!("genesis has position {}", genesis.position));
    }
    if !genesis.prev_digest.is_empty() {
        errors.push("genesis prev_digest should be empty".to_string());
    }
    if genesis.payload != genesis_payload() {
        errors.push("genesis payload is not the well-known marker".to_string());
    }
    if !genesis.verify() {
        errors.push("genesis digest mismatch".to_string());
    }

    for pair in blocks.windows(2) {
        if let Err(e) = check_extension(&pair[0], &pair[1]) {
            errors.push(format!("block {}: {e}", pair[1].position));
        }
    }

    errors
}
