//! Snapshot storage layer for rmcoin.
//!
//! The node is in-memory first; this crate lets it keep a durable snapshot
//! of its chain and pending pool between restarts:
//! - Blocks by index, plus the current chain length
//! - The pending transaction pool
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Node (rmcoin-chain)                   │
//! │          append / replace / submit / drain               │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌─────────────────────┐   ┌─────────────────────────┐  │
//! │  │ ChainStore          │   │ Storage (DB)            │  │
//! │  │  - block:{index}    │   │  - sled wrapper         │  │
//! │  │  - chain:length     │   │  - bincode encoding     │  │
//! │  │  - pool             │   │  - atomic batches       │  │
//! │  └─────────────────────┘   └─────────────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use rmcoin_core::Block;
//! use rmcoin_storage::ChainStore;
//!
//! let store = ChainStore::open("./rmcoin_data").unwrap();
//! store.save_chain(&[Block::genesis()]).unwrap();
//! assert_eq!(store.load_chain().unwrap().len(), 1);
//! ```

pub mod chain;
pub mod db;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{BatchOp, Result, Storage, StorageError};
