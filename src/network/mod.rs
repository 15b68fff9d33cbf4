//! Peer networking
//!
//! The peer registry, the wire packages a node speaks, and the client side
//! used to pull chains from peers during reconciliation.

pub mod node;
pub mod peer;
pub mod server;

pub use node::{Node, Nodes};
pub use peer::{ChainSource, ReportedChain, TcpChainSource};
pub use server::{send_request, Package, Server};
