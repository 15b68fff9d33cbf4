//! Error handling for the ledger
//!
//! This module provides the error type shared by every ledger operation.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for ledger operations
#[derive(Debug, Clone)]
pub enum LedgerError {
    /// Canonical encoding or wire (de)serialization failed
    Serialization(String),
    /// A peer was unreachable or answered with a malformed payload
    Network(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// Peer URL without a usable host
    InvalidAddress(String),
    /// The chain has no blocks (unreachable once genesis exists)
    EmptyChain,
    /// Mining errors
    Mining(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Network(msg) => write!(f, "Network error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            LedgerError::EmptyChain => write!(f, "Chain has no blocks"),
            LedgerError::Mining(msg) => write!(f, "Mining error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
