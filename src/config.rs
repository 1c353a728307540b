//! Node and ledger configuration.

use std::net::SocketAddr;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::hasher::DIGEST_HEX_LEN;
use crate::miner::DEFAULT_MAX_ATTEMPTS;

/// How concurrent appends are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendStrategy {
    /// One append at a time, lock held across mining.
    Serialized,
    /// Mine outside the lock, re-validate against the current tip at commit,
    /// re-mine up to `max_retries` times if the tip moved.
    Optimistic { max_retries: u32 },
}

/// Settings the ledger core needs from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Required leading zero hex symbols; 0 disables proof-of-work.
    pub difficulty: u32,
    /// Nonce bound per mining attempt.
    pub max_attempts: u64,
    pub strategy: AppendStrategy,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty as usize > DIGEST_HEX_LEN {
            return Err(ConfigError::DifficultyTooHigh(self.difficulty));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }

    pub fn pow_enabled(&self) -> bool {
        self.difficulty > 0
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            strategy: AppendStrategy::Serialized,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// HTTP listen address.
    pub listen: SocketAddr,
    pub ledger: LedgerConfig,
    /// Log level filter when RUST_LOG is unset.
    pub log_level: String,
}

impl NodeConfig {
    /// Build and validate configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let strategy = if cli.optimistic {
            AppendStrategy::Optimistic {
                max_retries: cli.max_retries,
            }
        } else {
            AppendStrategy::Serialized
        };
        let ledger = LedgerConfig {
            difficulty: cli.difficulty,
            max_attempts: cli.max_attempts,
            strategy,
        };
        ledger.validate()?;

        Ok(Self {
            listen: cli.listen,
            ledger,
            log_level: cli.log_level.clone(),
        })
    }
}
