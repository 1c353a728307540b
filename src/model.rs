//! Block model: sealing and self-verification.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::hasher::{self, BlockHasher, DigestInput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 0-indexed position; genesis is 0.
    pub position: u64,
    /// Opaque application data, hashed verbatim.
    pub payload: Value,
    /// RFC3339 capture time. Informational only.
    pub timestamp: String,
    /// Hex digest of the preceding block (empty for genesis).
    pub prev_digest: String,
    /// Required leading zero hex symbols (0 disables proof-of-work).
    pub difficulty_target: u32,
    /// Winning nonce; `None` when proof-of-work is disabled.
    pub nonce: Option<u64>,
    /// Hex SHA-256 over every other field, see [`crate::hasher`].
    pub digest: String,
}

impl Block {
    /// Build an immutable block, computing its digest.
    pub fn seal(
        position: u64,
        payload: Value,
        timestamp: String,
        prev_digest: String,
        difficulty_target: u32,
        nonce: Option<u64>,
    ) -> Self {
        let digest = hasher::digest(&DigestInput {
            position,
            timestamp: &timestamp,
            payload: &payload,
            prev_digest: &prev_digest,
            difficulty_target,
            nonce,
        });
        Self {
            position,
            payload,
            timestamp,
            prev_digest,
            difficulty_target,
            nonce,
            digest,
        }
    }

    /// Genesis block with the well-known payload.
    pub fn genesis(timestamp: String) -> Self {
        Self::seal(0, genesis_payload(), timestamp, String::new(), 0, None)
    }

    pub fn digest_input(&self) -> DigestInput<'_> {
        DigestInput {
            position: self.position,
            timestamp: &self.timestamp,
            payload: &self.payload,
            prev_digest: &self.prev_digest,
            difficulty_target: self.difficulty_target,
            nonce: self.nonce,
        }
    }

    /// Recompute the digest from this block's own fields.
    pub fn compute_digest(&self) -> String {
        BlockHasher::new(&self.digest_input()).finish(self.nonce)
    }

    /// True iff the stored digest matches the recomputed one.
    pub fn verify(&self) -> bool {
        self.compute_digest() == self.digest
    }

    pub fn is_genesis(&self) -> bool {
        self.position == 0
    }
}

/// Payload carried by the genesis block.
pub fn genesis_payload() -> Value {
    json!({ "genesis": true })
}
