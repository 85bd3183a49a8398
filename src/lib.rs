//! Mirror: One-Way Directory Synchronization
//!
//! Keeps a replica directory tree identical to a source directory tree by
//! running periodic, stateless reconciliation cycles. Content changes are
//! detected by digest, never by size or timestamp.

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod sync;
pub mod tree;
pub mod types;
