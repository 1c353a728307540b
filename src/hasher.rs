//! Block digest computation: canonical encoding v1 over SHA-256.
//!
//! Encoding, in order:
//! `"pow-ledger/block" || 0x01 || position(u64 BE) || len(u64 BE) timestamp ||
//! len(u64 BE) payload-json || len(u64 BE) prev_digest || difficulty(u32 BE) ||
//! nonce (0x00 | 0x01 u64 BE)`.
//!
//! `difficulty_target` is bound alongside position, timestamp, payload,
//! prev_digest and nonce, so a block cannot be re-labelled with a lower
//! target without its digest changing.
//!
//! Payload JSON is compact with object keys sorted, which is what
//! `serde_json::Value` produces without the `preserve_order` feature.
//! Changing any of this is a protocol break and needs a new version byte.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Domain separator for block digests.
pub const DOMAIN_TAG: &[u8] = b"pow-ledger/block";

/// Current canonical encoding version.
pub const ENCODING_VERSION: u8 = 1;

/// Number of hex symbols in a digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Every field of a block except its digest.
#[derive(Debug, Clone, Copy)]
pub struct DigestInput<'a> {
    pub position: u64,
    pub timestamp: &'a str,
    pub payload: &'a Value,
    pub prev_digest: &'a str,
    pub difficulty_target: u32,
    pub nonce: Option<u64>,
}

/// SHA-256 state primed with everything up to the nonce.
///
/// The miner hashes the same prefix once per attempt, so the prefix is
/// absorbed once and cloned for each nonce.
#[derive(Clone)]
pub struct BlockHasher {
    prefix: Sha256,
}

impl BlockHasher {
    pub fn new(input: &DigestInput<'_>) -> Self {
        let mut h = Sha256::new();
        h.update(DOMAIN_TAG);
        h.update([ENCODING_VERSION]);
        h.update(input.position.to_be_bytes());
        update_prefixed(&mut h, input.timestamp.as_bytes());
        update_prefixed(&mut h, input.payload.to_string().as_bytes());
        update_prefixed(&mut h, input.prev_digest.as_bytes());
        h.update(input.difficulty_target.to_be_bytes());
        Self { prefix: h }
    }

    /// Finish the digest with the given nonce; lowercase hex.
    pub fn finish(&self, nonce: Option<u64>) -> String {
        let mut h = self.prefix.clone();
        match nonce {
            None => h.update([0u8]),
            Some(n) => {
                h.update([1u8]);
                h.update(n.to_be_bytes());
            }
        }
        hex::encode(h.finalize())
    }
}

fn update_prefixed(h: &mut Sha256, bytes: &[u8]) {
    h.update((bytes.len() as u64).to_be_bytes());
    h.update(bytes);
}

/// Compute the digest of a block's canonical fields.
pub fn digest(input: &DigestInput<'_>) -> String {
    BlockHasher::new(input).finish(input.nonce)
}

/// Count of leading `'0'` symbols in a hex digest.
pub fn leading_zero_symbols(digest: &str) -> usize {
    digest.bytes().take_while(|b| *b == b'0').count()
}

/// Difficulty predicate. A target of 0 accepts every digest.
pub fn meets_difficulty(digest: &str, difficulty_target: u32) -> bool {
    leading_zero_symbols(digest) >= difficulty_target as usize
}
