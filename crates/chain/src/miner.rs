//! Block production: proof search and sealing with the reward.

use crate::ledger::Chain;
use crate::mempool::Mempool;
use rmcoin_consensus::ProofOfWork;
use rmcoin_core::{Block, Transaction};

/// Produces blocks for one node.
#[derive(Debug, Clone)]
pub struct Miner {
    pow: ProofOfWork,
    node_id: String,
    reward: u64,
}

impl Miner {
    /// Create a miner crediting `reward` to `node_id` for each block.
    pub fn new(pow: ProofOfWork, node_id: impl Into<String>, reward: u64) -> Self {
        Self {
            pow,
            node_id: node_id.into(),
            reward,
        }
    }

    pub fn pow(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The reward transaction appended to every mined block.
    pub fn reward_transaction(&self) -> Transaction {
        Transaction::reward(self.node_id.clone(), self.reward)
    }

    /// Find a proof extending `previous`. Holds no locks; may run long.
    pub fn search(&self, previous: &Block) -> u64 {
        self.pow.find_proof(previous.proof)
    }

    /// Drain `pool`, add the reward and append the block to `chain`.
    ///
    /// Must be called with `proof` found against the current tip of `chain`
    /// and with both the chain and the pool exclusively held.
    pub fn seal(&self, chain: &mut Chain, pool: &mut Mempool, proof: u64) -> Block {
        debug_assert!(self.pow.is_valid_proof(chain.last_block().proof, proof));
        let mut transactions = pool.drain();
        transactions.push(self.reward_transaction());
        chain.append(transactions, proof).clone()
    }
}
