//! Ledger integration tests
//!
//! Exercises the public API end to end: mining and sealing, chain
//! validation, and longest-chain reconciliation against real nodes over TCP.

use pow_ledger::{
    send_request, Block, Blockchain, Config, LedgerError, Nodes, Package, ProofOfWork, Server,
    TcpChainSource, Transaction, GENESIS_PROOF,
};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

const TIMEOUT: Duration = Duration::from_secs(5);

fn mined_ledger(blocks: usize) -> Blockchain {
    let blockchain = Blockchain::new().unwrap();
    for _ in 0..blocks {
        blockchain.mine_block("integration-miner").unwrap();
    }
    blockchain
}

/// Serve `blockchain` on an ephemeral port and return its address
fn spawn_node(blockchain: Blockchain) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = Server::new(
        blockchain,
        Arc::new(Nodes::new()),
        "peer-node".to_string(),
        TIMEOUT,
    );
    thread::spawn(move || server.serve(listener));
    addr
}

/// A peer that answers every request with the same raw bytes
fn spawn_fake_peer(reply: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let mut request = Vec::new();
            let _ = stream.read_to_end(&mut request);
            let _ = stream.write_all(reply.as_bytes());
        }
    });
    addr
}

fn registry(addrs: &[&str]) -> Nodes {
    let nodes = Nodes::new();
    for (i, addr) in addrs.iter().enumerate() {
        nodes
            .register(&format!("http://{addr}"), &format!("node-{i}"))
            .unwrap();
    }
    nodes
}

#[test]
fn test_proof_of_work_validation() {
    let proof = ProofOfWork::solve(GENESIS_PROOF);
    assert!(ProofOfWork::is_valid(GENESIS_PROOF, proof));
    if proof > 0 {
        assert!(!ProofOfWork::is_valid(GENESIS_PROOF, proof - 1));
    }
}

#[test]
fn test_manual_mining_flow() {
    let blockchain = Blockchain::new().unwrap();
    assert_eq!(blockchain.chain_length(), 1);

    let next = blockchain.queue_transaction("alice", "bob", 25);
    assert_eq!(next, 1);

    let tip = blockchain.tip().unwrap();
    let proof = ProofOfWork::solve(tip.get_proof());
    let block = blockchain.seal_block(proof, &tip.hash().unwrap()).unwrap();

    assert_eq!(block.get_index(), 1);
    assert_eq!(
        block.get_transactions(),
        &[Transaction::new("alice", "bob", 25)]
    );
    assert!(blockchain.pending_transactions().is_empty());
    assert!(Blockchain::validate_chain(&blockchain.chain()).unwrap());
}

#[test]
fn test_validation_detects_tampered_transaction() {
    let blockchain = Blockchain::new().unwrap();
    blockchain.queue_transaction("alice", "bob", 10);
    blockchain.mine_block("miner").unwrap();
    blockchain.mine_block("miner").unwrap();

    let mut chain = blockchain.chain();
    let sealed = chain[1].clone();
    let mut transactions = sealed.get_transactions().to_vec();
    transactions[0] = Transaction::new("alice", "bob", 10_000);
    chain[1] = Block::new(
        sealed.get_index(),
        sealed.get_timestamp(),
        transactions,
        sealed.get_proof(),
        sealed.get_prev_hash().to_string(),
    );

    assert!(!Blockchain::validate_chain(&chain).unwrap());
}

#[test]
fn test_resolve_adopts_longer_chain_over_tcp() {
    let local = mined_ledger(2);
    let remote = mined_ledger(4);
    let remote_chain = remote.chain();
    let addr = spawn_node(remote);

    let nodes = registry(&[&addr]);
    let replaced = local
        .resolve_conflicts(&nodes, &TcpChainSource::new(TIMEOUT))
        .unwrap();

    assert!(replaced);
    assert_eq!(local.chain_length(), 5);
    assert_eq!(local.chain(), remote_chain);
}

#[test]
fn test_resolve_keeps_chain_when_peer_is_shorter() {
    let local = mined_ledger(2);
    let before = local.chain();
    let addr = spawn_node(mined_ledger(1));

    let nodes = registry(&[&addr]);
    let replaced = local
        .resolve_conflicts(&nodes, &TcpChainSource::new(TIMEOUT))
        .unwrap();

    assert!(!replaced);
    assert_eq!(local.chain(), before);
}

#[test]
fn test_resolve_ignores_longer_invalid_chain() {
    let local = mined_ledger(1);
    let forged = Blockchain::new().unwrap();
    for _ in 0..4 {
        forged.seal_block(0, "forged").unwrap();
    }
    let addr = spawn_node(forged);

    let nodes = registry(&[&addr]);
    let replaced = local
        .resolve_conflicts(&nodes, &TcpChainSource::new(TIMEOUT))
        .unwrap();

    assert!(!replaced);
    assert_eq!(local.chain_length(), 2);
}

#[test]
fn test_resolve_aborts_when_a_peer_is_unreachable() {
    let local = Blockchain::new().unwrap();
    let good = spawn_node(mined_ledger(2));

    let closed = TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = closed.local_addr().unwrap().to_string();
    drop(closed);

    let nodes = registry(&[&dead, &good]);
    let result = local.resolve_conflicts(&nodes, &TcpChainSource::new(TIMEOUT));

    assert!(matches!(result, Err(LedgerError::Network(_))));
    assert_eq!(local.chain_length(), 1);
}

#[test]
fn test_resolve_aborts_on_malformed_payload() {
    let local = Blockchain::new().unwrap();
    let garbage = spawn_fake_peer("this is not json");

    let nodes = registry(&[&garbage]);
    let result = local.resolve_conflicts(&nodes, &TcpChainSource::new(TIMEOUT));

    assert!(matches!(result, Err(LedgerError::Network(_))));
}

#[test]
fn test_resolve_skips_peer_refusing_chain() {
    let local = Blockchain::new().unwrap();
    let refusing = spawn_fake_peer(r#"{"Error":{"error":"busy"}}"#);
    let good = spawn_node(mined_ledger(1));

    let nodes = registry(&[&refusing, &good]);
    let replaced = local
        .resolve_conflicts(&nodes, &TcpChainSource::new(TIMEOUT))
        .unwrap();

    assert!(replaced);
    assert_eq!(local.chain_length(), 2);
}

#[test]
fn test_node_request_round_trip() {
    let addr = spawn_node(Blockchain::new().unwrap());

    let reply = send_request(
        &addr,
        &Package::NewTransaction {
            sender: "alice".to_string(),
            recipient: "bob".to_string(),
            amount: 4,
        },
        TIMEOUT,
    )
    .unwrap();
    assert!(matches!(reply, Package::TransactionQueued { index: 1, .. }));

    let reply = send_request(&addr, &Package::Mine, Duration::from_secs(60)).unwrap();
    match reply {
        Package::Mined {
            index,
            transactions,
            ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(transactions[0], Transaction::new("alice", "bob", 4));
            assert_eq!(transactions[1].get_recipient(), "peer-node");
        }
        other => panic!("unexpected reply {other:?}"),
    }

    match send_request(&addr, &Package::GetChain, TIMEOUT).unwrap() {
        Package::Chain { chain, length } => {
            assert_eq!(length, 2);
            assert!(Blockchain::validate_chain(&chain).unwrap());
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[test]
fn test_node_resolves_through_registered_peer() {
    let peer_addr = spawn_node(mined_ledger(2));
    let addr = spawn_node(Blockchain::new().unwrap());

    let mut peers = std::collections::BTreeMap::new();
    peers.insert("longer".to_string(), format!("http://{peer_addr}"));
    let reply = send_request(&addr, &Package::RegisterNodes { nodes: peers }, TIMEOUT).unwrap();
    assert!(matches!(reply, Package::NodesRegistered { .. }));

    match send_request(&addr, &Package::Resolve, TIMEOUT).unwrap() {
        Package::Resolved {
            replaced, chain, ..
        } => {
            assert!(replaced);
            assert_eq!(chain.len(), 3);
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[test]
fn test_config_file_overrides() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("node.toml");
    std::fs::write(
        &path,
        r#"
node_address = "127.0.0.1:3101"
node_id = "file-node"
peer_timeout_ms = 1500

[peers]
alpha = "http://127.0.0.1:3100"
"#,
    )
    .unwrap();

    let config = Config::from_lookup(|_| None);
    config.load_file(&path).unwrap();

    assert_eq!(config.get_node_addr(), "127.0.0.1:3101");
    assert_eq!(config.get_node_id(), "file-node");
    assert_eq!(config.get_peer_timeout(), Duration::from_millis(1500));
    assert_eq!(
        config.get_peers().get("alpha").map(String::as_str),
        Some("http://127.0.0.1:3100")
    );
}

#[test]
fn test_config_file_errors() {
    let temp_dir = tempdir().unwrap();
    let config = Config::from_lookup(|_| None);

    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        config.load_file(&missing),
        Err(LedgerError::Config(_))
    ));

    let broken = temp_dir.path().join("broken.toml");
    std::fs::write(&broken, "peer_timeout_ms = \"soon\"").unwrap();
    assert!(matches!(
        config.load_file(&broken),
        Err(LedgerError::Config(_))
    ));
}
