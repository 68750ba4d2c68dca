//! Core ledger primitives for rmcoin.
//!
//! This crate provides the fundamental types used throughout the node:
//! - Blake3 hashing
//! - Transactions and their boundary validation
//! - Blocks, the fixed genesis block, and canonical block hashing

pub mod block;
pub mod hash;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{current_timestamp, Block, GENESIS_PROOF};
pub use hash::{hash, Hash, H256};
pub use transaction::{Transaction, TransactionError, TransactionRequest, REWARD_SENDER};
