use clap::Parser;
use log::{error, info, LevelFilter};
use pow_ledger::{
    send_request, Blockchain, Command, Nodes, Opt, Package, Server, GLOBAL_CONFIG,
};
use std::collections::BTreeMap;
use std::process;
use std::sync::Arc;
use std::time::Duration;

// Mining and reconciliation run inside the node's request, so the client waits longer
const LONG_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode { config } => {
            if let Some(path) = config {
                GLOBAL_CONFIG.load_file(&path)?;
            }

            let nodes = Arc::new(Nodes::new());
            for (key, url) in GLOBAL_CONFIG.get_peers() {
                nodes.register(&url, &key)?;
            }

            let node_id = GLOBAL_CONFIG.get_node_id();
            info!("Starting node {node_id} with {} known peers", nodes.len());

            let server = Server::new(
                Blockchain::new()?,
                nodes,
                node_id,
                GLOBAL_CONFIG.get_peer_timeout(),
            );
            server.run(&GLOBAL_CONFIG.get_node_addr())?;
        }
        Command::Transaction {
            sender,
            recipient,
            amount,
            node,
        } => {
            let reply = request(
                node,
                &Package::NewTransaction {
                    sender,
                    recipient,
                    amount,
                },
                GLOBAL_CONFIG.get_peer_timeout(),
            )?;
            if let Package::TransactionQueued { message, .. } = reply {
                println!("{message}");
            }
        }
        Command::Mine { node } => {
            let reply = request(node, &Package::Mine, LONG_REQUEST_TIMEOUT)?;
            if let Package::Mined {
                message,
                index,
                transactions,
                proof,
                prev_hash,
            } = reply
            {
                println!("{message}");
                println!("Index: {index}");
                println!("Proof: {proof}");
                println!("Prev hash: {prev_hash}");
                println!("Transactions: {}", transactions.len());
            }
        }
        Command::Printchain { node } => {
            let reply = request(node, &Package::GetChain, GLOBAL_CONFIG.get_peer_timeout())?;
            if let Package::Chain { chain, length } = reply {
                for block in &chain {
                    println!("Block {}", block.get_index());
                    println!("Timestamp: {}", block.get_timestamp());
                    println!("Proof: {}", block.get_proof());
                    println!("Prev hash: {}", block.get_prev_hash());
                    println!("Hash: {}", block.hash()?);
                    for tx in block.get_transactions() {
                        println!(
                            "- {} -> {}: {}",
                            tx.get_sender(),
                            tx.get_recipient(),
                            tx.get_amount()
                        );
                    }
                    println!();
                }
                println!("Length: {length}");
            }
        }
        Command::Register { key, url, node } => {
            let mut nodes = BTreeMap::new();
            nodes.insert(key, url);
            let reply = request(
                node,
                &Package::RegisterNodes { nodes },
                GLOBAL_CONFIG.get_peer_timeout(),
            )?;
            if let Package::NodesRegistered { message, nodes } = reply {
                println!("{message}");
                for (key, host) in nodes {
                    println!("{key}: {host}");
                }
            }
        }
        Command::Resolve { node } => {
            let reply = request(node, &Package::Resolve, LONG_REQUEST_TIMEOUT)?;
            if let Package::Resolved {
                message, chain, ..
            } = reply
            {
                println!("{message}");
                println!("Length: {}", chain.len());
            }
        }
    }
    Ok(())
}

/// Send `pkg` to `node` (or the configured node) and turn error replies into errors
fn request(
    node: Option<String>,
    pkg: &Package,
    timeout: Duration,
) -> Result<Package, Box<dyn std::error::Error>> {
    let addr = node.unwrap_or_else(|| GLOBAL_CONFIG.get_node_addr());
    match send_request(&addr, pkg, timeout)? {
        Package::Error { error } => Err(format!("Node {addr} failed: {error}").into()),
        reply => Ok(reply),
    }
}
