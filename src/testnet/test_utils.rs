//! Test utilities for ledger testing

use crate::core::{Block, Blockchain};
use crate::error::{LedgerError, Result};
use crate::network::{ChainSource, ReportedChain};
use std::collections::HashMap;

/// Reward address used by [`mine_chain`]
pub const TEST_MINER: &str = "test-miner";

/// Mine `blocks` properly linked blocks on top of the current tip
pub fn mine_chain(blockchain: &Blockchain, blocks: usize) -> Result<Vec<Block>> {
    (0..blocks)
        .map(|_| blockchain.mine_block(TEST_MINER))
        .collect()
}

enum Reply {
    Chain(ReportedChain),
    NoChain,
}

/// In-memory peers. Hosts that were never added behave as unreachable.
#[derive(Default)]
pub struct StaticChainSource {
    replies: HashMap<String, Reply>,
}

impl StaticChainSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(self, host: &str, chain: Vec<Block>) -> Self {
        let length = chain.len();
        self.with_reported(host, chain, length)
    }

    /// Peer that claims `length` regardless of the blocks it sends
    pub fn with_reported(mut self, host: &str, chain: Vec<Block>, length: usize) -> Self {
        self.replies
            .insert(host.to_string(), Reply::Chain(ReportedChain { chain, length }));
        self
    }

    pub fn with_no_chain(mut self, host: &str) -> Self {
        self.replies.insert(host.to_string(), Reply::NoChain);
        self
    }
}

impl ChainSource for StaticChainSource {
    fn fetch_chain(&self, host: &str) -> Result<Option<ReportedChain>> {
        match self.replies.get(host) {
            Some(Reply::Chain(reported)) => Ok(Some(reported.clone())),
            Some(Reply::NoChain) => Ok(None),
            None => Err(LedgerError::Network(format!("Failed to connect to {host}"))),
        }
    }
}
