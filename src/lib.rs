//! Single-node hash-chained ledger with proof-of-work admission.
//!
//! Blocks are sealed with a SHA-256 digest over a versioned canonical
//! encoding ([`hasher`]), validated against the tip ([`validation`]), mined
//! under a bounded nonce search ([`miner`]) and committed to an in-memory
//! chain guarded for concurrent appends ([`ledger`]). [`routes`] exposes
//! the chain over HTTP.

pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod hasher;
pub mod ledger;
pub mod miner;
pub mod model;
pub mod routes;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppendStrategy, LedgerConfig, NodeConfig};
pub use error::{ConfigError, ExtensionError, LedgerError, LedgerResult};
pub use ledger::{AuditReport, Ledger};
pub use miner::Miner;
pub use model::Block;
pub use routes::{router, AppState};
pub use validation::{check_extension, is_valid_extension};
