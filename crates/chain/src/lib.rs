//! Node orchestration for rmcoin.
//!
//! This crate brings the core types, proof of work and storage together
//! into a single node:
//! - **Ledger**: the chain of blocks, always rooted at genesis
//! - **Mempool**: pending transactions, drained by each mined block
//! - **Miner**: proof search and sealing with the reward transaction
//! - **Peers**: registered peer addresses used for consensus
//!
//! # Example
//!
//! ```rust,no_run
//! use rmcoin_chain::{Blockchain, BlockchainConfig};
//! use rmcoin_core::TransactionRequest;
//!
//! let blockchain = Blockchain::new(BlockchainConfig::default());
//!
//! let receipt = blockchain
//!     .add_transaction(TransactionRequest::new("Alice", "Bob", 50))
//!     .unwrap();
//! assert_eq!(receipt.block_index, 1);
//!
//! let block = blockchain.mine_block();
//! assert_eq!(block.index, 1);
//! assert!(blockchain.is_valid());
//! ```

pub mod blockchain;
pub mod ledger;
pub mod mempool;
pub mod miner;
pub mod peers;

// Re-export commonly used types
pub use blockchain::{
    Blockchain, BlockchainConfig, BlockchainStats, NodeError, PendingReceipt, Result,
};
pub use ledger::Chain;
pub use mempool::{Mempool, MempoolStats};
pub use miner::Miner;
pub use peers::PeerSet;
