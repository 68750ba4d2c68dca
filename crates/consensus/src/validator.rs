//! Block and chain validation rules.
//!
//! A chain is valid when it starts with the fixed genesis block, every block
//! carries a seal matching its contents, and every adjacent pair links by
//! index, previous hash, timestamp and proof of work.

use crate::pow::ProofOfWork;
use rmcoin_core::Block;
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("first block is not the genesis block")]
    InvalidGenesis,

    #[error("block {index} seal does not match its contents")]
    InvalidSeal { index: u64 },

    #[error("block index mismatch (expected {expected}, got {got})")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("block {index} previous_hash does not match its parent")]
    InvalidPrevHash { index: u64 },

    #[error("block {index} timestamp is earlier than its parent")]
    TimestampRegression { index: u64 },

    #[error("block {index} proof of work is invalid")]
    InvalidProof { index: u64 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Validate that the block's seal matches its contents.
    pub fn validate_seal(block: &Block) -> Result<()> {
        if !block.verify_seal() {
            return Err(ValidationError::InvalidSeal { index: block.index });
        }
        Ok(())
    }

    /// Validate block extends the parent correctly.
    pub fn validate_extends_parent(block: &Block, parent: &Block) -> Result<()> {
        let expected = parent.index + 1;
        if block.index != expected {
            return Err(ValidationError::InvalidIndex {
                expected,
                got: block.index,
            });
        }

        if block.previous_hash != parent.compute_hash() {
            return Err(ValidationError::InvalidPrevHash { index: block.index });
        }

        if block.timestamp < parent.timestamp {
            return Err(ValidationError::TimestampRegression { index: block.index });
        }

        Ok(())
    }

    /// Validate the block's proof against the parent's proof.
    pub fn validate_proof(block: &Block, parent: &Block, pow: &ProofOfWork) -> Result<()> {
        if !pow.is_valid_proof(parent.proof, block.proof) {
            return Err(ValidationError::InvalidProof { index: block.index });
        }
        Ok(())
    }

    /// Full block validation (seal + parent link + proof).
    pub fn validate_full(block: &Block, parent: &Block, pow: &ProofOfWork) -> Result<()> {
        Self::validate_seal(block)?;
        Self::validate_extends_parent(block, parent)?;
        Self::validate_proof(block, parent, pow)?;
        Ok(())
    }
}

/// Whole-chain validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate a chain, reporting the first violation found.
    pub fn validate(blocks: &[Block], pow: &ProofOfWork) -> Result<()> {
        let genesis = blocks.first().ok_or(ValidationError::EmptyChain)?;
        if !genesis.is_genesis() {
            return Err(ValidationError::InvalidGenesis);
        }

        for pair in blocks.windows(2) {
            BlockValidator::validate_full(&pair[1], &pair[0], pow)?;
        }

        Ok(())
    }

    /// Check whether a chain is valid.
    pub fn is_valid(blocks: &[Block], pow: &ProofOfWork) -> bool {
        Self::validate(blocks, pow).is_ok()
    }
}
