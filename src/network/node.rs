use crate::error::{LedgerError, Result};
use log::info;
use std::sync::{PoisonError, RwLock};

/// A registered peer: the name it was registered under and its `host[:port]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    key: String,
    host: String,
}

impl Node {
    fn new(key: String, host: String) -> Node {
        Node { key, host }
    }

    pub fn get_key(&self) -> &str {
        self.key.as_str()
    }

    pub fn get_host(&self) -> &str {
        self.host.as_str()
    }
}

/// Peer registry, kept in registration order
pub struct Nodes {
    inner: RwLock<Vec<Node>>,
}

impl Default for Nodes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes {
            inner: RwLock::new(vec![]),
        }
    }

    /// Registers the host of `url` under `key`, replacing any earlier host
    /// for that key in place.
    pub fn register(&self, url: &str, key: &str) -> Result<()> {
        let host = parse_host(url)?;
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.iter_mut().find(|node| node.key == key) {
            Some(node) => node.host = host,
            None => inner.push(Node::new(key.to_string(), host)),
        }
        info!("Registered peer {key} at {url}");
        Ok(())
    }

    /// Snapshot of every known peer
    pub fn addresses(&self) -> Vec<Node> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracts `host[:port]` from `scheme://host[:port]/path` or a bare `host[:port]`.
fn parse_host(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let rest = match trimmed.split_once("://") {
        Some((_scheme, rest)) => rest,
        None => trimmed,
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    // Drop userinfo, keep only what a peer can be dialed at
    let host = match authority.rsplit_once('@') {
        Some((_userinfo, host)) => host,
        None => authority,
    };

    if host.is_empty() || host.starts_with(':') {
        return Err(LedgerError::InvalidAddress(format!(
            "No host in peer url '{url}'"
        )));
    }
    Ok(host.to_string())
}
