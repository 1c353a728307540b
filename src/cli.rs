//! Command-line argument parsing.

use std::net::SocketAddr;

use clap::Parser;

/// Hash-chained proof-of-work ledger node.
#[derive(Parser, Debug, Clone)]
#[command(name = "pow-ledger-node")]
#[command(about = "Single-node hash-chained ledger served over HTTP")]
#[command(version)]
pub struct Cli {
    /// HTTP listen address.
    #[arg(long, env = "LEDGER_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Leading zero hex symbols required per block digest (0 disables PoW).
    #[arg(long, env = "LEDGER_DIFFICULTY", default_value_t = 1)]
    pub difficulty: u32,

    /// Nonces tried before an append fails with mining exhausted.
    #[arg(long, env = "LEDGER_MAX_ATTEMPTS", default_value_t = crate::miner::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u64,

    /// Mine outside the append lock and re-validate at commit.
    #[arg(long)]
    pub optimistic: bool,

    /// Re-mines allowed when the tip moves during an optimistic append.
    #[arg(long, default_value_t = 8)]
    pub max_retries: u32,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
