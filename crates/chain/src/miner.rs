//! Mining: turn a full batch of pending transactions into a block.

use crate::ledger::{Ledger, LedgerError};
use powchain_consensus::{BlockProposer, ConsensusError};
use powchain_core::{Blake3, BlockHeader, Concatenator, Digest, Hasher};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while mining.
#[derive(Debug, Error)]
pub enum MinerError {
    #[error("not enough pending transactions ({available} available, {required} required)")]
    InsufficientTransactions { available: usize, required: usize },

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, MinerError>;

/// Builds blocks from the front of a ledger's pool and appends them.
#[derive(Debug, Clone)]
pub struct Miner<H: Hasher = Blake3> {
    proposer: BlockProposer<H>,
}

impl Miner {
    /// A Blake3 miner for batches of `batch_size` transactions.
    pub fn new(batch_size: usize, version: u32) -> Self {
        Self {
            proposer: BlockProposer::new(batch_size, version),
        }
    }
}

impl<H: Hasher + Clone> Miner<H> {
    /// A miner with an explicit hasher.
    pub fn with_hasher(hasher: H, batch_size: usize, version: u32) -> Self {
        Self {
            proposer: BlockProposer::with_hasher(hasher, batch_size, version),
        }
    }

    /// A miner matching the ledger's hasher, batch size and version.
    pub fn for_ledger<C: Concatenator>(ledger: &Ledger<H, C>) -> Self {
        let config = ledger.config();
        Self::with_hasher(ledger.hasher().clone(), config.batch_size, config.version)
    }

    pub fn batch_size(&self) -> usize {
        self.proposer.batch_size()
    }

    /// Mine one block stamped with the current time.
    pub fn mine<C: Concatenator>(&mut self, ledger: &mut Ledger<H, C>) -> Result<Digest> {
        self.mine_at(ledger, BlockHeader::current_timestamp())
    }

    /// Mine one block with an explicit starting timestamp.
    ///
    /// Takes the oldest `batch_size` pending transactions, searches for a
    /// nonce meeting the ledger's target and appends the block. Returns the
    /// new block's hash. Fails without touching the ledger if the pool is
    /// short.
    pub fn mine_at<C: Concatenator>(
        &mut self,
        ledger: &mut Ledger<H, C>,
        timestamp: u32,
    ) -> Result<Digest> {
        let required = self.batch_size();
        let available = ledger.pool().len();
        if available < required {
            return Err(MinerError::InsufficientTransactions {
                available,
                required,
            });
        }

        let batch = ledger.pool()[..required].to_vec();
        let prev = ledger.last().hash_with(ledger.hasher());
        let target = ledger.current_target();

        let started = Instant::now();
        let (block, solution) = self.proposer.propose_block(prev, batch, timestamp, target)?;
        info!(
            target,
            nonce = solution.header.nonce,
            attempts = solution.attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "block mined"
        );

        Ok(ledger.append_block(block)?)
    }
}
