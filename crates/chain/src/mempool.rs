//! Transaction pool for pending transactions.
//!
//! The pool keeps submitted transactions in arrival order until the next
//! mined block drains all of them at once.

use rmcoin_core::Transaction;
use std::collections::HashSet;

/// Pending, unconfirmed transactions in submission order.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a pool from previously saved transactions.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Get the number of pending transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction, returning its 0-based position in the pool.
    pub fn submit(&mut self, tx: Transaction) -> usize {
        let position = self.transactions.len();
        self.transactions.push(tx);
        position
    }

    /// Take every pending transaction, leaving the pool empty.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Read-only view of the pending transactions.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Get a snapshot of the pending transactions.
    pub fn pending(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Get pool statistics.
    pub fn stats(&self) -> MempoolStats {
        let senders: HashSet<&str> = self
            .transactions
            .iter()
            .map(|tx| tx.sender.as_str())
            .collect();

        MempoolStats {
            total_transactions: self.len(),
            unique_senders: senders.len(),
            total_amount: self
                .transactions
                .iter()
                .fold(0u64, |sum, tx| sum.saturating_add(tx.amount)),
        }
    }
}

/// Pool statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolStats {
    /// Total number of transactions.
    pub total_transactions: usize,
    /// Number of unique senders.
    pub unique_senders: usize,
    /// Sum of pending amounts (saturating).
    pub total_amount: u64,
}
