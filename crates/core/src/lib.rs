//! Core ledger primitives for powchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Digests and the pluggable hash function
//! - Deterministic byte concatenation for hashing composite values
//! - The hash-based PRNG used for key and nonce material
//! - Key-prefixed Schnorr signatures
//! - Transactions, blocks and block headers
//! - Fixed-capacity Merkle trees

pub mod block;
pub mod concat;
pub mod hash;
pub mod merkle;
pub mod prng;
pub mod schnorr;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, BlockHeader, HeaderError, HEADER_SIZE};
pub use concat::{concat, Concatenator, Encode, LengthPrefixedConcat, UnifiedConcat};
pub use hash::{hash, Blake3, Digest, Hasher, H256};
pub use merkle::{merkle_root, MerkleError, MerkleProof, MerkleTree};
pub use prng::HashRng;
pub use schnorr::{
    sign, verify, CryptoError, GroupParams, Keypair, PrivateKey, PublicKey, ScalarSource, Signature,
};
pub use transaction::Transaction;
