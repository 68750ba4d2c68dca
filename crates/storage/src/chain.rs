//! Chain and pool snapshots.

use crate::db::{BatchOp, Result, Storage, StorageError};
use rmcoin_core::{Block, Transaction};
use std::path::Path;

/// Keys for chain metadata.
const CHAIN_LENGTH_KEY: &[u8] = b"chain:length";
const POOL_KEY: &[u8] = b"pool";

/// Persists the node's chain and pending pool.
///
/// Blocks are stored under `block:{index}`; `chain:length` is the number
/// of blocks that belong to the current chain.
#[derive(Clone)]
pub struct ChainStore {
    storage: Storage,
}

impl ChainStore {
    /// Create a new ChainStore wrapping the given storage.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Storage::open(path)?))
    }

    /// Open an in-memory store (for testing).
    pub fn open_temporary() -> Result<Self> {
        Ok(Self::new(Storage::open_temporary()?))
    }

    // =========================================================================
    // Chain
    // =========================================================================

    /// Check if a chain has been saved.
    pub fn is_initialized(&self) -> Result<bool> {
        self.storage.contains(CHAIN_LENGTH_KEY)
    }

    /// Get the saved chain length. Returns 0 if nothing was saved.
    pub fn get_length(&self) -> Result<u64> {
        Ok(self.storage.get::<_, u64>(CHAIN_LENGTH_KEY)?.unwrap_or(0))
    }

    /// Get a saved block by index.
    pub fn get_block(&self, index: u64) -> Result<Option<Block>> {
        if index >= self.get_length()? {
            return Ok(None);
        }
        self.storage.get(Storage::block_key(index))
    }

    /// Replace the saved chain with `blocks` in one atomic batch.
    ///
    /// Blocks past the new length are removed so a shorter snapshot never
    /// leaves a stale tail behind.
    pub fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        let ops = self.chain_ops(blocks)?;
        self.storage.batch(ops)?;
        self.storage.flush()
    }

    /// Replace the saved chain and pool together in one atomic batch.
    pub fn save_snapshot(&self, blocks: &[Block], pending: &[Transaction]) -> Result<()> {
        let mut ops = self.chain_ops(blocks)?;
        ops.push(BatchOp::insert(POOL_KEY, &pending)?);
        self.storage.batch(ops)?;
        self.storage.flush()
    }

    /// Append one block and save the pool left after it, in one batch.
    ///
    /// The block's index must equal the saved length. Writing both together
    /// means a restart never sees a transaction both in a block and pending.
    pub fn append_block(&self, block: &Block, pending: &[Transaction]) -> Result<()> {
        let length = self.get_length()?;
        if block.index != length {
            return Err(StorageError::Corrupt(format!(
                "expected block index {}, got {}",
                length, block.index
            )));
        }

        self.storage.batch(vec![
            BatchOp::insert(Storage::block_key(block.index), block)?,
            BatchOp::insert(CHAIN_LENGTH_KEY, &(length + 1))?,
            BatchOp::insert(POOL_KEY, &pending)?,
        ])?;
        self.storage.flush()
    }

    fn chain_ops(&self, blocks: &[Block]) -> Result<Vec<BatchOp>> {
        let old_length = self.get_length()?;
        let new_length = blocks.len() as u64;

        let mut ops = Vec::with_capacity(blocks.len() + 2);
        for block in blocks {
            ops.push(BatchOp::insert(Storage::block_key(block.index), block)?);
        }
        for index in new_length..old_length {
            ops.push(BatchOp::Remove {
                key: Storage::block_key(index),
            });
        }
        ops.push(BatchOp::insert(CHAIN_LENGTH_KEY, &new_length)?);
        Ok(ops)
    }

    /// Load the saved chain in index order.
    pub fn load_chain(&self) -> Result<Vec<Block>> {
        let length = self.get_length()?;
        let mut blocks = Vec::with_capacity(length as usize);
        for index in 0..length {
            let block: Block = self.storage.get_or_err(Storage::block_key(index))?;
            if block.index != index {
                return Err(StorageError::Corrupt(format!(
                    "block stored at {} has index {}",
                    index, block.index
                )));
            }
            blocks.push(block);
        }
        Ok(blocks)
    }

    // =========================================================================
    // Pool
    // =========================================================================

    /// Save the pending pool.
    pub fn save_pool(&self, pending: &[Transaction]) -> Result<()> {
        self.storage.put(POOL_KEY, &pending)?;
        self.storage.flush()
    }

    /// Load the pending pool. Returns an empty pool if nothing was saved.
    pub fn load_pool(&self) -> Result<Vec<Transaction>> {
        Ok(self.storage.get(POOL_KEY)?.unwrap_or_default())
    }
}
