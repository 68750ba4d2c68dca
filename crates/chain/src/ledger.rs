//! The node's chain of blocks.
//!
//! A [`Chain`] always starts with the fixed genesis block and is only ever
//! mutated by appending a mined block or by a full replacement with a chain
//! that already passed validation.

use rmcoin_consensus::{ChainValidator, ProofOfWork, ValidationError};
use rmcoin_core::{Block, Transaction};

/// Ordered, append-only sequence of blocks starting with genesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Create a chain holding only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// Build a chain from existing blocks, validating them first.
    pub fn from_blocks(blocks: Vec<Block>, pow: &ProofOfWork) -> Result<Self, ValidationError> {
        ChainValidator::validate(&blocks, pow)?;
        Ok(Self { blocks })
    }

    /// Get all blocks in index order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the chain has no blocks. Never true once built.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the most recent block.
    pub fn last_block(&self) -> &Block {
        // Genesis is always present.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Get a block by index.
    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Seal `transactions` with `proof` into a new block on top of the tip.
    ///
    /// The caller is responsible for `proof` being valid against the tip.
    pub fn append(&mut self, transactions: Vec<Transaction>, proof: u64) -> &Block {
        let block = Block::next(self.last_block(), transactions, proof);
        self.blocks.push(block);
        self.last_block()
    }

    /// Swap in a chain that has already been validated.
    pub(crate) fn replace(&mut self, blocks: Vec<Block>) {
        debug_assert!(!blocks.is_empty());
        self.blocks = blocks;
    }

    /// Validate the chain, reporting the first violation.
    pub fn validate(&self, pow: &ProofOfWork) -> Result<(), ValidationError> {
        ChainValidator::validate(&self.blocks, pow)
    }

    /// Check whether the chain is valid.
    pub fn is_valid(&self, pow: &ProofOfWork) -> bool {
        self.validate(pow).is_ok()
    }

    /// Consume the chain, returning its blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(1)
    }

    fn mine(chain: &mut Chain, pow: &ProofOfWork, transactions: Vec<Transaction>) {
        let proof = pow.find_proof(chain.last_block().proof);
        chain.append(transactions, proof);
    }

    #[test]
    fn test_new_chain_is_genesis() {
        let chain = Chain::new();

        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert!(chain.last_block().is_genesis());
        assert!(chain.is_valid(&pow()));
    }

    #[test]
    fn test_append_links_to_tip() {
        let pow = pow();
        let mut chain = Chain::new();
        let tx = Transaction::new("Alice", "Bob", 50).unwrap();

        mine(&mut chain, &pow, vec![tx.clone()]);

        let block = chain.last_block();
        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, chain.blocks()[0].compute_hash());
        assert_eq!(block.transactions, vec![tx]);
        assert!(chain.is_valid(&pow));
    }

    #[test]
    fn test_appended_chains_stay_valid() {
        let pow = pow();
        let mut chain = Chain::new();
        for amount in 1..=5 {
            let tx = Transaction::new("Alice", "Bob", amount).unwrap();
            mine(&mut chain, &pow, vec![tx]);
            assert!(chain.is_valid(&pow));
        }
        assert_eq!(chain.len(), 6);
        assert_eq!(chain.get(3).map(|b| b.index), Some(3));
        assert!(chain.get(6).is_none());
    }

    #[test]
    fn test_field_tampering_detected() {
        let pow = pow();
        let mut chain = Chain::new();
        for amount in 1..=3 {
            let tx = Transaction::new("Alice", "Bob", amount).unwrap();
            mine(&mut chain, &pow, vec![tx]);
        }

        let tamperings: [fn(&mut Block); 4] = [
            |b: &mut Block| b.timestamp += 1,
            |b: &mut Block| b.transactions[0].receiver = "Mallory".into(),
            |b: &mut Block| b.proof += 1,
            |b: &mut Block| b.previous_hash = rmcoin_core::Hash([1u8; 32]),
        ];

        for tamper in tamperings {
            for index in 1..chain.len() {
                let mut blocks = chain.blocks().to_vec();
                tamper(&mut blocks[index]);
                assert!(
                    ChainValidator::validate(&blocks, &pow).is_err(),
                    "tampering block {index} went unnoticed"
                );
            }
        }
    }

    #[test]
    fn test_from_blocks_rejects_invalid() {
        let pow = pow();
        let mut chain = Chain::new();
        mine(&mut chain, &pow, vec![]);

        let mut blocks = chain.clone().into_blocks();
        assert_eq!(Chain::from_blocks(blocks.clone(), &pow), Ok(chain));

        blocks[1].proof += 1;
        assert!(Chain::from_blocks(blocks, &pow).is_err());
        assert_eq!(
            Chain::from_blocks(Vec::new(), &pow),
            Err(ValidationError::EmptyChain)
        );
    }
}
