// The ledger: committed blocks plus the transactions waiting for the next block.
// Everything lives in memory behind one mutex; proof search and peer I/O run
// outside of it so submitting a transaction never waits on mining.

use crate::core::{Block, ProofOfWork, Transaction};
use crate::error::{LedgerError, Result};
use crate::network::{ChainSource, Nodes};
use crate::utils::current_timestamp;
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Puzzle solution stored in the genesis block
pub const GENESIS_PROOF: u64 = 100;
/// Linkage placeholder for the genesis block, which has no predecessor
pub const GENESIS_PREV_HASH: &str = "1";
/// Sender recorded on mining reward transactions
pub const REWARD_SENDER: &str = "0";
/// Amount credited to the miner of each block
pub const MINING_REWARD: i64 = 1;
/// Times `mine_block` restarts after the tip is replaced under it
pub const MAX_MINING_ATTEMPTS: usize = 3;

struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl LedgerState {
    fn next_index(&self) -> usize {
        match self.chain.last() {
            Some(tip) => tip.get_index() + 1,
            None => self.chain.len(),
        }
    }
}

/// Handle to one in-memory ledger. Clones share the same chain.
#[derive(Clone)]
pub struct Blockchain {
    // Poisoned locks are recovered: state only changes by pushes and
    // whole assignments.
    state: Arc<Mutex<LedgerState>>,
    // Serializes mine_block callers without touching the ledger lock
    mining: Arc<Mutex<()>>,
}

impl Blockchain {
    /// Creates a ledger holding only the genesis block.
    pub fn new() -> Result<Blockchain> {
        let genesis = Block::new(
            0,
            current_timestamp()?,
            Vec::new(),
            GENESIS_PROOF,
            GENESIS_PREV_HASH.to_string(),
        );
        info!("Created genesis block at {}", genesis.get_timestamp());

        Ok(Blockchain {
            state: Arc::new(Mutex::new(LedgerState {
                chain: vec![genesis],
                pending: Vec::new(),
            })),
            mining: Arc::new(Mutex::new(())),
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffers a transaction and returns the index of the block that will hold it.
    pub fn queue_transaction(&self, sender: &str, recipient: &str, amount: i64) -> usize {
        let mut state = self.lock_state();
        state
            .pending
            .push(Transaction::new(sender, recipient, amount));
        state.next_index()
    }

    /// Last committed block
    pub fn tip(&self) -> Result<Block> {
        self.lock_state()
            .chain
            .last()
            .cloned()
            .ok_or(LedgerError::EmptyChain)
    }

    /// Seals every pending transaction into a new block and appends it.
    ///
    /// `proof` and `prev_hash` are trusted as given; they are only checked
    /// later by [`Blockchain::validate_chain`].
    pub fn seal_block(&self, proof: u64, prev_hash: &str) -> Result<Block> {
        let timestamp = current_timestamp()?;
        let mut state = self.lock_state();
        Ok(Self::seal_locked(&mut state, timestamp, proof, prev_hash))
    }

    fn seal_locked(state: &mut LedgerState, timestamp: i64, proof: u64, prev_hash: &str) -> Block {
        let transactions = std::mem::take(&mut state.pending);
        let block = Block::new(
            state.chain.len(),
            timestamp,
            transactions,
            proof,
            prev_hash.to_string(),
        );
        state.chain.push(block.clone());

        info!(
            "Sealed block {} with {} transactions",
            block.get_index(),
            block.get_transactions().len()
        );
        block
    }

    /// Solves the puzzle for the current tip, credits `reward_address` and
    /// seals the next block.
    ///
    /// If the chain is replaced while the puzzle is being solved, the search
    /// restarts on the new tip, up to [`MAX_MINING_ATTEMPTS`] times.
    pub fn mine_block(&self, reward_address: &str) -> Result<Block> {
        let _mining = self.mining.lock().unwrap_or_else(PoisonError::into_inner);

        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        for _ in 0..MAX_MINING_ATTEMPTS {
            let last_block = self.tip()?;
            info!(
                "Mining on top of block {} with {workers} workers",
                last_block.get_index()
            );
            let proof = ProofOfWork::solve_parallel(last_block.get_proof(), workers);

            if let Some(block) = self.seal_mined(&last_block, proof, reward_address)? {
                return Ok(block);
            }
            warn!(
                "Tip moved past block {} while mining, starting over",
                last_block.get_index()
            );
        }

        Err(LedgerError::Mining(format!(
            "Chain kept changing under the miner after {MAX_MINING_ATTEMPTS} attempts"
        )))
    }

    /// Seals a block carrying the reward on top of `last_block`, or returns
    /// `None` without touching the ledger if `last_block` is no longer the tip.
    fn seal_mined(
        &self,
        last_block: &Block,
        proof: u64,
        reward_address: &str,
    ) -> Result<Option<Block>> {
        let prev_hash = last_block.hash()?;
        let timestamp = current_timestamp()?;

        let mut state = self.lock_state();
        let tip_hash = match state.chain.last() {
            Some(tip) => tip.hash()?,
            None => return Err(LedgerError::EmptyChain),
        };
        if tip_hash != prev_hash {
            return Ok(None);
        }

        state
            .pending
            .push(Transaction::new(REWARD_SENDER, reward_address, MINING_REWARD));
        Ok(Some(Self::seal_locked(&mut state, timestamp, proof, &prev_hash)))
    }

    /// Checks hash linkage and puzzle solutions of every adjacent pair.
    ///
    /// Chains with fewer than two blocks are valid. Index contiguity and
    /// timestamps are not checked.
    pub fn validate_chain(chain: &[Block]) -> Result<bool> {
        for pair in chain.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if cur.get_prev_hash() != prev.hash()? {
                return Ok(false);
            }
            if !ProofOfWork::is_valid(prev.get_proof(), cur.get_proof()) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Longest valid chain rule.
    ///
    /// Polls every registered peer, adopts the longest valid chain strictly
    /// longer than ours (first seen wins ties) and reports whether the local
    /// chain was replaced. A failure talking to any peer aborts the whole
    /// attempt.
    pub fn resolve_conflicts(&self, nodes: &Nodes, source: &dyn ChainSource) -> Result<bool> {
        let local_length = self.chain_length();
        let mut max_length = local_length;
        let mut new_chain: Option<Vec<Block>> = None;

        for node in nodes.addresses() {
            let host = node.get_host();
            let reported = match source.fetch_chain(host)? {
                Some(reported) => reported,
                None => {
                    warn!("Peer {host} did not offer a chain, skipping");
                    continue;
                }
            };

            if reported.chain.len() != reported.length {
                return Err(LedgerError::Network(format!(
                    "Peer {host} reported length {} but sent {} blocks",
                    reported.length,
                    reported.chain.len()
                )));
            }

            if reported.length <= max_length {
                continue;
            }
            if Self::validate_chain(&reported.chain)? {
                max_length = reported.length;
                new_chain = Some(reported.chain);
            } else {
                warn!(
                    "Rejected invalid chain of length {} from {host}",
                    reported.length
                );
            }
        }

        let Some(chain) = new_chain else {
            info!("Local chain of length {local_length} is authoritative");
            return Ok(false);
        };

        let mut state = self.lock_state();
        if state.chain.len() >= max_length {
            warn!(
                "Local chain grew to {} blocks while resolving, keeping it",
                state.chain.len()
            );
            return Ok(false);
        }
        state.chain = chain;
        info!("Replaced local chain with peer chain of length {max_length}");
        Ok(true)
    }

    /// Snapshot of the committed chain
    pub fn chain(&self) -> Vec<Block> {
        self.lock_state().chain.clone()
    }

    pub fn chain_length(&self) -> usize {
        self.lock_state().chain.len()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.lock_state().pending.clone()
    }
}
