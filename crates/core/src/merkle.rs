//! Fixed-capacity Merkle commitment over a batch of transactions.
//!
//! Leaves are `H(payload)`. Each level hashes disjoint adjacent pairs,
//! `H(left || right)`, until one digest remains. When a level has an odd
//! number of nodes the last node is paired with itself.

use crate::hash::{Blake3, Digest, Hasher};
use crate::transaction::Transaction;
use thiserror::Error;

/// Errors that can occur while building a Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("invalid batch size (expected {expected}, got {got})")]
    InvalidBatchSize { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, MerkleError>;

/// Compute the Merkle root of a list of leaf digests.
///
/// Returns the zero digest if the list is empty.
pub fn merkle_root<H: Hasher>(hasher: &H, leaves: &[Digest]) -> Digest {
    if leaves.is_empty() {
        return Digest::ZERO;
    }

    let mut current_level: Vec<Digest> = leaves.to_vec();
    while current_level.len() > 1 {
        current_level = next_level(hasher, &current_level);
    }
    current_level[0]
}

fn next_level<H: Hasher>(hasher: &H, level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| {
            let right = pair.get(1).unwrap_or(&pair[0]);
            hasher.digest_parts(&[pair[0].as_ref(), right.as_ref()])
        })
        .collect()
}

/// A Merkle tree with a fixed number of leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree<H: Hasher = Blake3> {
    hasher: H,
    capacity: usize,
    /// All nodes of the last build, level by level (leaves first).
    levels: Vec<Vec<Digest>>,
}

/// Inclusion proof for a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Digest,
    /// Sibling digests from leaf to root.
    pub siblings: Vec<Digest>,
    /// Direction for each sibling (true = sibling is on the right).
    pub directions: Vec<bool>,
}

impl MerkleTree {
    /// A Blake3 tree with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self::with_hasher(Blake3, capacity)
    }
}

impl<H: Hasher> MerkleTree<H> {
    /// A tree with an explicit hasher.
    pub fn with_hasher(hasher: H, capacity: usize) -> Self {
        Self {
            hasher,
            capacity,
            levels: Vec::new(),
        }
    }

    /// Number of transactions a build expects.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Build the tree over exactly `capacity` transactions.
    ///
    /// On error the previously built tree is left untouched.
    pub fn build(&mut self, transactions: &[Transaction]) -> Result<&Self> {
        let leaves: Vec<Digest> = transactions
            .iter()
            .map(|tx| tx.hash_with(&self.hasher))
            .collect();
        self.build_from_leaves(&leaves)
    }

    /// Build the tree over exactly `capacity` leaf digests.
    pub fn build_from_leaves(&mut self, leaves: &[Digest]) -> Result<&Self> {
        if leaves.len() != self.capacity {
            return Err(MerkleError::InvalidBatchSize {
                expected: self.capacity,
                got: leaves.len(),
            });
        }

        let mut levels = vec![leaves.to_vec()];
        loop {
            let current = &levels[levels.len() - 1];
            if current.len() <= 1 {
                break;
            }
            let next = next_level(&self.hasher, current);
            levels.push(next);
        }

        self.levels = levels;
        Ok(self)
    }

    /// Root of the last successful build, or the zero digest.
    pub fn root(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Digest::ZERO)
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaves = self.levels.first()?;
        let leaf = *leaves.get(index)?;

        let mut siblings = Vec::new();
        let mut directions = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = idx % 2 == 0;
            let sibling_idx = if is_right { idx + 1 } else { idx - 1 };
            // Odd node pairs with itself.
            let sibling = level.get(sibling_idx).copied().unwrap_or(level[idx]);

            siblings.push(sibling);
            directions.push(is_right);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            siblings,
            directions,
        })
    }

    /// Verify a proof against this tree's root.
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.hasher, &self.root(), proof)
    }
}

/// Verify a Merkle proof against a given root.
pub fn verify_proof<H: Hasher>(hasher: &H, root: &Digest, proof: &MerkleProof) -> bool {
    if proof.siblings.len() != proof.directions.len() {
        return false;
    }

    let mut current = proof.leaf;
    for (sibling, is_right) in proof.siblings.iter().zip(proof.directions.iter()) {
        current = if *is_right {
            hasher.digest_parts(&[current.as_ref(), sibling.as_ref()])
        } else {
            hasher.digest_parts(&[sibling.as_ref(), current.as_ref()])
        };
    }

    current == *root
}
