//! Proof of Work consensus for rmcoin.
//!
//! This crate provides the consensus rules every node must agree on:
//! - The proof-of-work predicate and the deterministic proof search
//! - Block and whole-chain validation (genesis, seals, links, proofs)
//! - Longest-valid-chain resolution against peer chains
//!
//! # Example
//!
//! ```rust
//! use rmcoin_consensus::{resolve, ChainValidator, ProofOfWork};
//! use rmcoin_core::Block;
//!
//! let pow = ProofOfWork::new(2);
//! let genesis = Block::genesis();
//! let proof = pow.find_proof(genesis.proof);
//! let peer_chain = vec![genesis.clone(), Block::next(&genesis, vec![], proof)];
//! assert!(ChainValidator::is_valid(&peer_chain, &pow));
//!
//! let local = vec![genesis];
//! let resolution = resolve(&local, vec![("localhost:5001".to_string(), peer_chain)], &pow);
//! assert!(resolution.adopted());
//! ```

pub mod pow;
pub mod resolver;
pub mod validator;

// Re-export commonly used types
pub use pow::{ProofOfWork, DEFAULT_DIFFICULTY};
pub use resolver::{resolve, ChainFetcher, ConsensusError, FetchError, MemoryFetcher, Resolution};
pub use validator::{BlockValidator, ChainValidator, ValidationError};
