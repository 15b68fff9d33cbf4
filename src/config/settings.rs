use crate::error::{LedgerError, Result};
use log::warn;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use uuid::Uuid;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_NODE_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;

const NODE_ADDRESS_KEY: &str = "NODE_ADDRESS";
const NODE_ID_KEY: &str = "NODE_ID";
const PEER_TIMEOUT_KEY: &str = "PEER_TIMEOUT_MS";

/// Optional TOML overrides, e.g.
///
/// ```toml
/// node_address = "127.0.0.1:3001"
/// peer_timeout_ms = 2000
///
/// [peers]
/// alpha = "http://127.0.0.1:3000"
/// ```
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    node_address: Option<String>,
    node_id: Option<String>,
    peer_timeout_ms: Option<u64>,
    #[serde(default)]
    peers: BTreeMap<String, String>,
}

pub struct Config {
    inner: RwLock<HashMap<String, String>>,
    peers: RwLock<BTreeMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Seeded from `NODE_ADDRESS`, `NODE_ID` and `PEER_TIMEOUT_MS`
    pub fn new() -> Config {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut map = HashMap::new();
        map.insert(
            String::from(NODE_ADDRESS_KEY),
            lookup(NODE_ADDRESS_KEY).unwrap_or_else(|| DEFAULT_NODE_ADDR.to_string()),
        );
        map.insert(
            String::from(NODE_ID_KEY),
            lookup(NODE_ID_KEY).unwrap_or_else(new_node_id),
        );

        let timeout = match lookup(PEER_TIMEOUT_KEY).map(|raw| raw.parse::<u64>()) {
            Some(Ok(ms)) => ms,
            Some(Err(e)) => {
                warn!("Ignoring invalid {PEER_TIMEOUT_KEY}: {e}");
                DEFAULT_PEER_TIMEOUT_MS
            }
            None => DEFAULT_PEER_TIMEOUT_MS,
        };
        map.insert(String::from(PEER_TIMEOUT_KEY), timeout.to_string());

        Config {
            inner: RwLock::new(map),
            peers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Merge settings from a TOML file over the current values
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let settings: FileSettings = toml::from_str(&raw)?;

        if let Some(addr) = settings.node_address {
            self.set_node_addr(addr);
        }
        if let Some(node_id) = settings.node_id {
            self.set_node_id(node_id);
        }
        if let Some(ms) = settings.peer_timeout_ms {
            self.set_peer_timeout_ms(ms);
        }
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(settings.peers);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(String::from(key), value);
    }

    pub fn get_node_addr(&self) -> String {
        self.get(NODE_ADDRESS_KEY)
            .unwrap_or_else(|| DEFAULT_NODE_ADDR.to_string())
    }

    pub fn set_node_addr(&self, addr: String) {
        self.set(NODE_ADDRESS_KEY, addr);
    }

    /// Identity credited with mining rewards
    pub fn get_node_id(&self) -> String {
        match self.get(NODE_ID_KEY) {
            Some(node_id) => node_id,
            None => {
                let node_id = new_node_id();
                self.set_node_id(node_id.clone());
                node_id
            }
        }
    }

    pub fn set_node_id(&self, node_id: String) {
        self.set(NODE_ID_KEY, node_id);
    }

    pub fn get_peer_timeout(&self) -> Duration {
        let ms = self
            .get(PEER_TIMEOUT_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PEER_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub fn set_peer_timeout_ms(&self, ms: u64) {
        self.set(PEER_TIMEOUT_KEY, ms.to_string());
    }

    /// Peers to register at startup: key -> url
    pub fn get_peers(&self) -> BTreeMap<String, String> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn new_node_id() -> String {
    Uuid::new_v4().simple().to_string()
}
