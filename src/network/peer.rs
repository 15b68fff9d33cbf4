use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::network::server::{send_request, Package};
use log::warn;
use std::time::Duration;

/// A chain as reported by a peer, together with the length it claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedChain {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Where reconciliation gets peer chains from.
///
/// `Ok(None)` means the peer answered but offered no chain; it is skipped.
/// `Err` means the peer could not be reached or sent garbage, which aborts
/// reconciliation.
pub trait ChainSource: Send + Sync {
    fn fetch_chain(&self, host: &str) -> Result<Option<ReportedChain>>;
}

/// Asks peers for their chain over the node wire protocol
pub struct TcpChainSource {
    timeout: Duration,
}

impl TcpChainSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ChainSource for TcpChainSource {
    fn fetch_chain(&self, host: &str) -> Result<Option<ReportedChain>> {
        match send_request(host, &Package::GetChain, self.timeout)? {
            Package::Chain { chain, length } => Ok(Some(ReportedChain { chain, length })),
            Package::Error { error } => {
                warn!("Peer {host} refused chain request: {error}");
                Ok(None)
            }
            other => Err(LedgerError::Network(format!(
                "Unexpected reply to chain request from {host}: {}",
                other.name()
            ))),
        }
    }
}
