use crate::core::Transaction;
use crate::error::Result;
use crate::utils::sha256_hex;
use serde::{Deserialize, Serialize};

/// A sealed group of transactions linked to its predecessor by hash.
///
/// Field order defines the canonical encoding used by [`Block::hash`]:
/// `index, timestamp, transactions, proof, prev_hash`. Every peer must hash
/// the same bytes, so reordering or renaming fields breaks chain validation
/// across nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: usize,
    timestamp: i64,
    transactions: Vec<Transaction>,
    proof: u64,
    prev_hash: String,
}

impl Block {
    pub fn new(
        index: usize,
        timestamp: i64,
        transactions: Vec<Transaction>,
        proof: u64,
        prev_hash: String,
    ) -> Block {
        Block {
            index,
            timestamp,
            transactions,
            proof,
            prev_hash,
        }
    }

    /// Content hash: lowercase hex SHA-256 of the compact JSON encoding
    pub fn hash(&self) -> Result<String> {
        let encoded = serde_json::to_vec(self)?;
        Ok(sha256_hex(&encoded))
    }

    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_proof(&self) -> u64 {
        self.proof
    }

    pub fn get_prev_hash(&self) -> &str {
        self.prev_hash.as_str()
    }
}
