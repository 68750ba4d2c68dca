//! Block structure and canonical hashing.

use crate::hash::{hash, Hash};
use crate::transaction::Transaction;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 1;

/// The canonical, order-preserving view of a block that gets hashed.
///
/// Field order is part of the wire contract: bincode encodes fields in
/// declaration order with fixed-width little-endian integers.
#[derive(Serialize)]
struct BlockContents<'a> {
    index: u64,
    timestamp: u64,
    transactions: &'a [Transaction],
    proof: u64,
    previous_hash: &'a Hash,
}

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (0 for genesis).
    pub index: u64,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Transactions sealed into this block, in drain order.
    pub transactions: Vec<Transaction>,
    /// Proof of work against the previous block's proof.
    pub proof: u64,
    /// Hash of the previous block.
    pub previous_hash: Hash,
    /// Seal: hash of this block's contents at creation time.
    pub hash: Hash,
}

impl Block {
    /// Create a sealed block from its contents.
    pub fn new(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: Hash,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            transactions,
            proof,
            previous_hash,
            hash: Hash::ZERO,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Create the genesis block. Every node derives the same one.
    pub fn genesis() -> Self {
        Self::new(0, 0, Vec::new(), GENESIS_PROOF, Hash::ZERO)
    }

    /// Build the block that follows `previous`.
    ///
    /// The timestamp is clamped so it never goes below the parent's.
    pub fn next(previous: &Block, transactions: Vec<Transaction>, proof: u64) -> Self {
        let timestamp = current_timestamp().max(previous.timestamp);
        Self::new(
            previous.index + 1,
            timestamp,
            transactions,
            proof,
            previous.compute_hash(),
        )
    }

    /// Hash the block's canonical contents. Ignores the cached seal.
    pub fn compute_hash(&self) -> Hash {
        let contents = BlockContents {
            index: self.index,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            proof: self.proof,
            previous_hash: &self.previous_hash,
        };
        let encoded = bincode::serialize(&contents).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Check that the cached seal matches the contents.
    pub fn verify_seal(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

/// Get the current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
