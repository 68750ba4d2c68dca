//! Proof of Work predicate and proof search.
//!
//! A proof `p'` is valid against the previous proof `p` when the Blake3 hash
//! of the decimal rendering of `p'² − p²` starts with `difficulty` zero hex
//! digits. The rule only depends on the two proofs, so verification is a
//! single hash while the search is a linear scan over candidates.

use rmcoin_core::{hash, Hash};
use tracing::warn;

/// Number of leading zero hex digits required by default.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Maximum meaningful difficulty (a Blake3 digest has 64 hex digits).
pub const MAX_DIFFICULTY: usize = 64;

/// Proof of Work rule shared by every node of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl ProofOfWork {
    /// Create a rule requiring `difficulty` leading zero hex digits.
    pub fn new(difficulty: usize) -> Self {
        let difficulty = difficulty.min(MAX_DIFFICULTY);
        if difficulty >= 8 {
            warn!(
                target: "mining",
                difficulty,
                "difficulty may be unsolvable in reasonable time"
            );
        }
        Self { difficulty }
    }

    /// Get the configured difficulty.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Hash the combination of two proofs.
    ///
    /// Returns `None` when `proof² − previous_proof²` does not fit in an
    /// `i128`; such a proof can never be valid.
    pub fn challenge(previous_proof: u64, proof: u64) -> Option<Hash> {
        let previous = i128::from(previous_proof);
        let candidate = i128::from(proof);
        let value = candidate
            .checked_mul(candidate)?
            .checked_sub(previous.checked_mul(previous)?)?;
        Some(hash(value.to_string().as_bytes()))
    }

    /// Check whether `proof` is a valid successor of `previous_proof`.
    pub fn is_valid_proof(&self, previous_proof: u64, proof: u64) -> bool {
        Self::challenge(previous_proof, proof)
            .is_some_and(|digest| digest.leading_zero_nibbles() >= self.difficulty)
    }

    /// Search candidates `0, 1, 2, …` until one satisfies the rule.
    ///
    /// This is unbounded CPU work and must not run while holding locks on
    /// shared chain state.
    pub fn find_proof(&self, previous_proof: u64) -> u64 {
        let mut candidate = 0u64;
        loop {
            if self.is_valid_proof(previous_proof, candidate) {
                return candidate;
            }
            candidate = candidate.wrapping_add(1);
        }
    }
}
