//! Pool of verified transactions waiting to be mined.
//!
//! The pool only ever holds transactions whose signature has already been
//! checked by the ledger. Order of arrival is preserved, and the miner takes
//! batches from the front.

use powchain_core::{Digest, Transaction};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("transaction already in pool: {0}")]
    Duplicate(Digest),

    #[error("pool is full (capacity: {0})")]
    Full(usize),

    #[error("transaction not found in pool: {0}")]
    TransactionNotFound(Digest),
}

pub type Result<T> = std::result::Result<T, PoolError>;

/// FIFO pool of pending transactions, at most one per hash.
#[derive(Debug, Clone)]
pub struct Pool {
    /// Maximum number of pending transactions.
    capacity: usize,
    /// Pending transactions in arrival order.
    transactions: Vec<Transaction>,
    /// Hash of each entry in `transactions`, same order.
    hashes: Vec<Digest>,
    /// Set of pending hashes for fast lookup.
    tx_hashes: HashSet<Digest>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transactions: Vec::new(),
            hashes: Vec::new(),
            tx_hashes: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// All pending transactions, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Check if a transaction with this hash is pending.
    pub fn contains(&self, tx_hash: &Digest) -> bool {
        self.tx_hashes.contains(tx_hash)
    }

    /// Append a transaction under `tx_hash`.
    ///
    /// The hash is supplied by the caller, which owns the hash function.
    pub fn add(&mut self, tx_hash: Digest, tx: Transaction) -> Result<()> {
        if self.contains(&tx_hash) {
            return Err(PoolError::Duplicate(tx_hash));
        }
        if self.transactions.len() >= self.capacity {
            return Err(PoolError::Full(self.capacity));
        }

        self.tx_hashes.insert(tx_hash);
        self.hashes.push(tx_hash);
        self.transactions.push(tx);
        Ok(())
    }

    /// Locate each hash in `tx_hashes`. The pool itself is not touched.
    ///
    /// A hash repeated in `tx_hashes` is an error, since the pool holds at
    /// most one transaction per hash.
    pub fn find_positions(&self, tx_hashes: &[Digest]) -> Result<Vec<usize>> {
        let mut seen = HashSet::with_capacity(tx_hashes.len());
        let mut positions = Vec::with_capacity(tx_hashes.len());

        for tx_hash in tx_hashes {
            if !seen.insert(*tx_hash) {
                return Err(PoolError::Duplicate(*tx_hash));
            }
            let slot = self
                .hashes
                .iter()
                .position(|pending| pending == tx_hash)
                .ok_or(PoolError::TransactionNotFound(*tx_hash))?;
            positions.push(slot);
        }

        Ok(positions)
    }

    /// Remove the transactions at `positions`, keeping the order of the rest.
    ///
    /// Out-of-range positions are ignored.
    pub fn remove_positions(&mut self, positions: &[usize]) {
        for &slot in positions {
            if let Some(tx_hash) = self.hashes.get(slot) {
                self.tx_hashes.remove(tx_hash);
            }
        }

        let mut index = 0;
        self.transactions.retain(|_| {
            let keep = !positions.contains(&index);
            index += 1;
            keep
        });
        let mut index = 0;
        self.hashes.retain(|_| {
            let keep = !positions.contains(&index);
            index += 1;
            keep
        });
    }

/// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_transactions: self.len(),
            total_bytes: self.transactions.iter().map(Transaction::len).sum(),
            capacity: self.capacity,
        }
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(10_000)
    }
}

/// Pool statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of pending transactions.
    pub total_transactions: usize,
    /// Sum of pending payload sizes.
    pub total_bytes: usize,
    /// Pool capacity.
    pub capacity: usize,
}
