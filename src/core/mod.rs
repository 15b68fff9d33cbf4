//! Core ledger functionality
//!
//! Transactions, blocks, the proof-of-work puzzle and the ledger that links
//! them together.

pub mod block;
pub mod blockchain;
pub mod proof_of_work;
pub mod transaction;

pub use block::Block;
pub use blockchain::{
    Blockchain, GENESIS_PREV_HASH, GENESIS_PROOF, MAX_MINING_ATTEMPTS, MINING_REWARD, REWARD_SENDER,
};
pub use proof_of_work::{ProofOfWork, REQUIRED_SUFFIX};
pub use transaction::Transaction;
