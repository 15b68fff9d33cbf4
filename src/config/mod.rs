//! Configuration management
//!
//! Node address, node identity, peer timeouts and startup peers, read from
//! the environment and optionally a TOML file.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
