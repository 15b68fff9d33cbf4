//! # pow-ledger
//!
//! A single-node, in-memory, append-only ledger of transactions grouped into
//! hash-linked blocks, gated by a hashcash-style proof of work, with
//! longest-valid-chain reconciliation against peers.
//!
//! ## Layout
//! - `core/`: transactions, blocks, the proof-of-work puzzle and the ledger
//! - `network/`: peer registry, wire packages, node server, peer chain fetching
//! - `config/`: node address, identity, peer timeout and startup peers
//! - `error/`: the crate error type
//! - `utils/`: hashing and clock helpers
//! - `cli/`: command-line definitions for the node binary
//!
//! ## Flow
//! Transactions are queued as pending. Mining solves the puzzle against the
//! tip's proof without holding the ledger lock, then seals every pending
//! transaction into a block linked to the tip's hash. Reconciliation polls
//! registered peers and adopts the longest chain that validates.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::{Config, GLOBAL_CONFIG};
pub use crate::core::{
    Block, Blockchain, ProofOfWork, Transaction, GENESIS_PREV_HASH, GENESIS_PROOF,
    MAX_MINING_ATTEMPTS, MINING_REWARD, REQUIRED_SUFFIX, REWARD_SENDER,
};
pub use error::{LedgerError, Result};
pub use network::{
    send_request, ChainSource, Node, Nodes, Package, ReportedChain, Server, TcpChainSource,
};
pub use utils::{current_timestamp, sha256_digest, sha256_hex};
