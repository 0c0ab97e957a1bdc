//! Block and block header structures.

use crate::hash::{Blake3, Digest, Hasher};
use crate::merkle::merkle_root;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Size of a serialized header in bytes.
pub const HEADER_SIZE: usize = 80;

/// Errors that can occur while decoding a header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("invalid header length (expected 80, got {0})")]
    InvalidLength(usize),
}

/// The header of a block.
///
/// The hash input is the 80-byte layout produced by [`BlockHeader::to_bytes`]:
///
/// ```text
/// offset  size  field
///      0     4  version    (u32, little-endian)
///      4    32  prev       (digest bytes)
///     36    32  txn_root   (digest bytes)
///     68     4  timestamp  (u32, little-endian)
///     72     4  target     (u32, little-endian)
///     76     4  nonce      (u32, little-endian)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Header format version.
    pub version: u32,
    /// Hash of the previous block's header.
    pub prev: Digest,
    /// Merkle root of the block's transactions.
    pub txn_root: Digest,
    /// Unix timestamp in seconds.
    pub timestamp: u32,
    /// Required number of leading zero bits in word 0 of the header hash.
    pub target: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialize to the fixed 80-byte layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev.as_bytes());
        out[36..68].copy_from_slice(self.txn_root.as_bytes());
        out[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        out[72..76].copy_from_slice(&self.target.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Parse the fixed 80-byte layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() != HEADER_SIZE {
            return Err(HeaderError::InvalidLength(bytes.len()));
        }

        let u32_at = |at: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&bytes[at..at + 4]);
            u32::from_le_bytes(word)
        };
        let digest_at = |at: usize| {
            let mut d = [0u8; 32];
            d.copy_from_slice(&bytes[at..at + 32]);
            Digest(d)
        };

        Ok(Self {
            version: u32_at(0),
            prev: digest_at(4),
            txn_root: digest_at(36),
            timestamp: u32_at(68),
            target: u32_at(72),
            nonce: u32_at(76),
        })
    }

    /// Blake3 hash of the serialized header.
    pub fn hash(&self) -> Digest {
        self.hash_with(&Blake3)
    }

    /// Hash of the serialized header under an explicit hasher.
    pub fn hash_with<H: Hasher>(&self, hasher: &H) -> Digest {
        hasher.digest(&self.to_bytes())
    }

    /// Get the current Unix timestamp, saturating at `u32::MAX`.
    pub fn current_timestamp() -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }
}

/// A block: header plus the ordered transactions it commits to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Transactions, in commitment order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create a block from a header and its transactions.
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// The genesis block: zeroed header, empty body.
    pub fn genesis() -> Self {
        Self::default()
    }

    /// Get the block hash (hash of the header).
    pub fn hash(&self) -> Digest {
        self.header.hash()
    }

    /// Block hash under an explicit hasher.
    pub fn hash_with<H: Hasher>(&self, hasher: &H) -> Digest {
        self.header.hash_with(hasher)
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.header == BlockHeader::default() && self.transactions.is_empty()
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Merkle root over this block's transactions.
    pub fn compute_txn_root<H: Hasher>(&self, hasher: &H) -> Digest {
        let leaves: Vec<Digest> = self
            .transactions
            .iter()
            .map(|tx| tx.hash_with(hasher))
            .collect();
        merkle_root(hasher, &leaves)
    }

    /// Verify the header's root matches the transactions.
    pub fn verify_txn_root<H: Hasher>(&self, hasher: &H) -> bool {
        self.compute_txn_root(hasher) == self.header.txn_root
    }
}
