use crate::core::{Block, Blockchain, Transaction};
use crate::error::{LedgerError, Result};
use crate::network::{Nodes, TcpChainSource};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Deserializer;
use std::collections::BTreeMap;
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Wire packages. A client sends one request package and half-closes its
/// write side; the node answers with exactly one response package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Package {
    Status,
    GetChain,
    NewTransaction {
        sender: String,
        recipient: String,
        amount: i64,
    },
    Mine,
    /// Peer key -> peer url
    RegisterNodes {
        nodes: BTreeMap<String, String>,
    },
    Resolve,

    StatusReport {
        status: String,
    },
    Chain {
        chain: Vec<Block>,
        length: usize,
    },
    TransactionQueued {
        message: String,
        index: usize,
    },
    Mined {
        message: String,
        index: usize,
        transactions: Vec<Transaction>,
        proof: u64,
        prev_hash: String,
    },
    /// Peer key -> registered host
    NodesRegistered {
        message: String,
        nodes: BTreeMap<String, String>,
    },
    Resolved {
        message: String,
        replaced: bool,
        chain: Vec<Block>,
    },
    Error {
        error: String,
    },
}

impl Package {
    pub fn name(&self) -> &'static str {
        match self {
            Package::Status => "Status",
            Package::GetChain => "GetChain",
            Package::NewTransaction { .. } => "NewTransaction",
            Package::Mine => "Mine",
            Package::RegisterNodes { .. } => "RegisterNodes",
            Package::Resolve => "Resolve",
            Package::StatusReport { .. } => "StatusReport",
            Package::Chain { .. } => "Chain",
            Package::TransactionQueued { .. } => "TransactionQueued",
            Package::Mined { .. } => "Mined",
            Package::NodesRegistered { .. } => "NodesRegistered",
            Package::Resolved { .. } => "Resolved",
            Package::Error { .. } => "Error",
        }
    }
}

/// Node server: translates wire packages into ledger operations
#[derive(Clone)]
pub struct Server {
    blockchain: Blockchain,
    nodes: Arc<Nodes>,
    node_id: String,
    peer_timeout: Duration,
}

impl Server {
    pub fn new(
        blockchain: Blockchain,
        nodes: Arc<Nodes>,
        node_id: String,
        peer_timeout: Duration,
    ) -> Self {
        Self {
            blockchain,
            nodes,
            node_id,
            peer_timeout,
        }
    }

    /// Bind `addr` and serve until the listener fails
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| LedgerError::Network(format!("Failed to bind to {addr}: {e}")))?;
        self.serve(listener)
    }

    /// Accept connections on an already bound listener, one thread each
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("Node {} listening on {}", self.node_id, listener.local_addr()?);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let server = self.clone();
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream, peer_addr) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }

    fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        set_timeouts(&stream, CONNECTION_TIMEOUT)?;

        let reader = BufReader::new(&stream);
        let request = Deserializer::from_reader(reader)
            .into_iter::<Package>()
            .next();

        let response = match request {
            None => return Ok(()),
            Some(Ok(pkg)) => {
                info!("Received {} request from {peer_addr}", pkg.name());
                self.process_request(pkg)
            }
            Some(Err(e)) => {
                warn!("Malformed request from {peer_addr}: {e}");
                Package::Error {
                    error: format!("Malformed request: {e}"),
                }
            }
        };

        serde_json::to_writer(&stream, &response)
            .map_err(|e| LedgerError::Network(format!("Failed to send response: {e}")))?;
        let _ = (&stream).flush();
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    /// Runs one request against the ledger; failures become `Package::Error`
    pub fn process_request(&self, pkg: Package) -> Package {
        let result = match pkg {
            Package::Status => Ok(Package::StatusReport {
                status: "ok".to_string(),
            }),
            Package::GetChain => Ok(self.chain_package()),
            Package::NewTransaction {
                sender,
                recipient,
                amount,
            } => Ok(self.handle_new_transaction(&sender, &recipient, amount)),
            Package::Mine => self.handle_mine(),
            Package::RegisterNodes { nodes } => self.handle_register_nodes(nodes),
            Package::Resolve => self.handle_resolve(),
            other => Err(LedgerError::Network(format!(
                "Unexpected request package {}",
                other.name()
            ))),
        };

        result.unwrap_or_else(|e| {
            error!("Request failed: {e}");
            Package::Error {
                error: e.to_string(),
            }
        })
    }

    fn chain_package(&self) -> Package {
        let chain = self.blockchain.chain();
        let length = chain.len();
        Package::Chain { chain, length }
    }

    fn handle_new_transaction(&self, sender: &str, recipient: &str, amount: i64) -> Package {
        let index = self.blockchain.queue_transaction(sender, recipient, amount);
        Package::TransactionQueued {
            message: format!("Transaction will be added to Block {index}"),
            index,
        }
    }

    fn handle_mine(&self) -> Result<Package> {
        let block = self.blockchain.mine_block(&self.node_id)?;
        Ok(Package::Mined {
            message: "New Block Forged".to_string(),
            index: block.get_index(),
            transactions: block.get_transactions().to_vec(),
            proof: block.get_proof(),
            prev_hash: block.get_prev_hash().to_string(),
        })
    }

    fn handle_register_nodes(&self, nodes: BTreeMap<String, String>) -> Result<Package> {
        for (key, url) in &nodes {
            self.nodes.register(url, key)?;
        }

        let registered = self
            .nodes
            .addresses()
            .into_iter()
            .map(|node| (node.get_key().to_string(), node.get_host().to_string()))
            .collect();
        Ok(Package::NodesRegistered {
            message: "New nodes have been added".to_string(),
            nodes: registered,
        })
    }

    fn handle_resolve(&self) -> Result<Package> {
        let source = TcpChainSource::new(self.peer_timeout);
        let replaced = self.blockchain.resolve_conflicts(&self.nodes, &source)?;
        let message = if replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        };
        Ok(Package::Resolved {
            message: message.to_string(),
            replaced,
            chain: self.blockchain.chain(),
        })
    }
}

/// Send one request package to the node at `addr` and wait for its answer
pub fn send_request(addr: &str, pkg: &Package, timeout: Duration) -> Result<Package> {
    let socket_addr = addr
        .to_socket_addrs()
        .map_err(|e| LedgerError::Network(format!("Invalid address {addr}: {e}")))?
        .next()
        .ok_or_else(|| LedgerError::Network(format!("Address {addr} did not resolve")))?;

    let stream = TcpStream::connect_timeout(&socket_addr, timeout)
        .map_err(|e| LedgerError::Network(format!("Failed to connect to {addr}: {e}")))?;
    set_timeouts(&stream, timeout)?;

    serde_json::to_writer(&stream, pkg)
        .map_err(|e| LedgerError::Network(format!("Failed to send data to {addr}: {e}")))?;
    stream
        .shutdown(Shutdown::Write)
        .map_err(|e| LedgerError::Network(format!("Failed to finish request to {addr}: {e}")))?;

    serde_json::from_reader(BufReader::new(&stream))
        .map_err(|e| LedgerError::Network(format!("Malformed response from {addr}: {e}")))
}

fn set_timeouts(stream: &TcpStream, timeout: Duration) -> Result<()> {
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| LedgerError::Network(format!("Failed to set write timeout: {e}")))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| LedgerError::Network(format!("Failed to set read timeout: {e}")))
}
