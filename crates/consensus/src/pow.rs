//! Proof of Work (PoW) block production.
//!
//! A header satisfies the work predicate when its hash has at least `target`
//! leading zero bits, counted over word 0 (the most-significant 64 bits)
//! only. Targets above 64 can therefore never be met and are rejected up
//! front.

use powchain_core::{Blake3, Block, BlockHeader, Digest, Hasher, MerkleError, MerkleTree, Transaction};
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::debug;

/// Largest target the first-word predicate can satisfy.
pub const MAX_TARGET: u32 = 64;

/// Errors that can occur during block production.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("invalid batch size (expected {expected}, got {got})")]
    InvalidBatchSize { expected: usize, got: usize },

    #[error("target {0} is unreachable (maximum is 64)")]
    UnreachableTarget(u32),
}

impl From<MerkleError> for ConsensusError {
    fn from(err: MerkleError) -> Self {
        match err {
            MerkleError::InvalidBatchSize { expected, got } => {
                ConsensusError::InvalidBatchSize { expected, got }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Check the work predicate: `leading_zero_bits(word0) >= target`.
pub fn meets_target(hash: &Digest, target: u32) -> bool {
    hash.leading_zero_bits() >= target
}

/// A header whose hash meets its own target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    /// The solved header.
    pub header: BlockHeader,
    /// Its hash.
    pub hash: Digest,
    /// Number of headers hashed to find it.
    pub attempts: u64,
}

/// Try every nonce in `nonces`, in order, keeping all other fields fixed.
///
/// Returns `None` if no nonce in the range satisfies `header.target`.
pub fn search_range<H: Hasher>(
    hasher: &H,
    header: BlockHeader,
    nonces: RangeInclusive<u32>,
) -> Option<Solution> {
    let mut candidate = header;
    let mut attempts = 0u64;

    for nonce in nonces {
        candidate.nonce = nonce;
        attempts += 1;
        let hash = candidate.hash_with(hasher);
        if meets_target(&hash, candidate.target) {
            return Some(Solution {
                header: candidate,
                hash,
                attempts,
            });
        }
    }

    None
}

/// Search nonces from `header.nonce` upward until the target is met.
///
/// If the 32-bit nonce space runs out, the timestamp is bumped by one second
/// and the search restarts at nonce 0. Blocks the calling thread.
pub fn search<H: Hasher>(hasher: &H, header: BlockHeader) -> Result<Solution> {
    if header.target > MAX_TARGET {
        return Err(ConsensusError::UnreachableTarget(header.target));
    }

    let mut candidate = header;
    let mut attempts = 0u64;
    let mut start = header.nonce;

    loop {
        if let Some(mut solution) = search_range(hasher, candidate, start..=u32::MAX) {
            solution.attempts += attempts;
            return Ok(solution);
        }

        attempts += u64::from(u32::MAX - start) + 1;
        candidate.timestamp = candidate.timestamp.wrapping_add(1);
        start = 0;
        debug!(timestamp = candidate.timestamp, "nonce space exhausted, bumping timestamp");
    }
}

/// Assembles candidate blocks and solves their proof of work.
#[derive(Debug, Clone)]
pub struct BlockProposer<H: Hasher = Blake3> {
    /// Hash function shared with the ledger.
    hasher: H,
    /// Merkle builder sized to the batch.
    merkle: MerkleTree<H>,
    /// Header version written into every block.
    version: u32,
}

impl BlockProposer {
    /// A Blake3 proposer for batches of `batch_size` transactions.
    pub fn new(batch_size: usize, version: u32) -> Self {
        Self::with_hasher(Blake3, batch_size, version)
    }
}

impl<H: Hasher + Clone> BlockProposer<H> {
    /// A proposer with an explicit hasher.
    pub fn with_hasher(hasher: H, batch_size: usize, version: u32) -> Self {
        Self {
            merkle: MerkleTree::with_hasher(hasher.clone(), batch_size),
            hasher,
            version,
        }
    }

    /// Number of transactions per block.
    pub fn batch_size(&self) -> usize {
        self.merkle.capacity()
    }

    /// Build the unsolved header (nonce 0) committing to `transactions`.
    pub fn assemble(
        &mut self,
        prev: Digest,
        transactions: &[Transaction],
        timestamp: u32,
        target: u32,
    ) -> Result<BlockHeader> {
        let txn_root = self.merkle.build(transactions)?.root();
        Ok(BlockHeader {
            version: self.version,
            prev,
            txn_root,
            timestamp,
            target,
            nonce: 0,
        })
    }

    /// Assemble a block over `transactions` and search for a valid nonce.
    pub fn propose_block(
        &mut self,
        prev: Digest,
        transactions: Vec<Transaction>,
        timestamp: u32,
        target: u32,
    ) -> Result<(Block, Solution)> {
        if target > MAX_TARGET {
            return Err(ConsensusError::UnreachableTarget(target));
        }

        let header = self.assemble(prev, &transactions, timestamp, target)?;
        let solution = search(&self.hasher, header)?;
        Ok((Block::new(solution.header, transactions), solution))
    }
}
