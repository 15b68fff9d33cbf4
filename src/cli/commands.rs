use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pow-ledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode {
        #[arg(long = "config", help = "TOML file with node settings and peers")]
        config: Option<PathBuf>,
    },
    #[command(name = "transaction", about = "Queue a transaction on a node")]
    Transaction {
        #[arg(help = "Sender identifier")]
        sender: String,
        #[arg(help = "Recipient identifier")]
        recipient: String,
        #[arg(help = "Amount to transfer", allow_negative_numbers = true)]
        amount: i64,
        #[arg(long = "node", help = "Node address (defaults to NODE_ADDRESS)")]
        node: Option<String>,
    },
    #[command(name = "mine", about = "Ask a node to mine the next block")]
    Mine {
        #[arg(long = "node", help = "Node address (defaults to NODE_ADDRESS)")]
        node: Option<String>,
    },
    #[command(name = "printchain", about = "Print every block held by a node")]
    Printchain {
        #[arg(long = "node", help = "Node address (defaults to NODE_ADDRESS)")]
        node: Option<String>,
    },
    #[command(name = "register", about = "Register a peer with a node")]
    Register {
        #[arg(help = "Name to register the peer under")]
        key: String,
        #[arg(help = "Peer url, e.g. http://127.0.0.1:3001")]
        url: String,
        #[arg(long = "node", help = "Node address (defaults to NODE_ADDRESS)")]
        node: Option<String>,
    },
    #[command(name = "resolve", about = "Run longest-chain reconciliation on a node")]
    Resolve {
        #[arg(long = "node", help = "Node address (defaults to NODE_ADDRESS)")]
        node: Option<String>,
    },
}
