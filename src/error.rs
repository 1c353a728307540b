//! Ledger error types.

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a candidate block does not extend a tip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtensionError {
    #[error("position mismatch: expected {expected}, got {actual}")]
    PositionMismatch { expected: u64, actual: u64 },

    #[error("prev_digest does not match tip digest {expected}")]
    PrevDigestMismatch { expected: String, actual: String },

    #[error("stored digest does not match recomputed digest")]
    DigestMismatch,

    #[error("insufficient proof-of-work: required {required} leading zeros, got {actual}")]
    InsufficientWork { required: u32, actual: usize },

    /// The tip advanced while the candidate was being mined.
    #[error("tip advanced while mining (tip is now position {tip_position})")]
    StaleTip { tip_position: u64 },

    /// Candidate declares a difficulty other than the ledger's.
    #[error("difficulty target mismatch: ledger requires {expected}, got {actual}")]
    DifficultyMismatch { expected: u32, actual: u32 },
}

/// Errors surfaced by ledger operations. None of these mutate the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Payload could not be decoded or is empty.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Candidate failed validation against the tip.
    #[error("invalid extension at position {position}: {reason}")]
    InvalidExtension {
        position: u64,
        #[source]
        reason: ExtensionError,
    },

    /// No nonce satisfied the difficulty within the attempt bound.
    #[error("mining exhausted after {attempts} attempts")]
    MiningExhausted { attempts: u64 },

    /// Block digest does not match its fields: corruption or tampering.
    #[error("digest mismatch for block at position {position}")]
    DigestMismatch { position: u64 },
}

impl LedgerError {
    /// Classify a validator rejection for the block at `position`.
    pub fn rejected(position: u64, reason: ExtensionError) -> Self {
        match reason {
            ExtensionError::DigestMismatch => LedgerError::DigestMismatch { position },
            reason => LedgerError::InvalidExtension { position, reason },
        }
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::MalformedInput(_) => "malformed_input",
            LedgerError::InvalidExtension { .. } => "invalid_extension",
            LedgerError::MiningExhausted { .. } => "mining_exhausted",
            LedgerError::DigestMismatch { .. } => "digest_mismatch",
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::MiningExhausted { .. }
                | LedgerError::InvalidExtension {
                    reason: ExtensionError::StaleTip { .. },
                    ..
                }
        )
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("difficulty {0} exceeds digest length of 64 hex symbols")]
    DifficultyTooHigh(u32),

    #[error("max_attempts must be greater than zero")]
    ZeroAttempts,
}
