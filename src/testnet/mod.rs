//! Shared helpers for unit tests: mining short chains and in-memory peers.

pub mod test_utils;

pub use test_utils::*;
