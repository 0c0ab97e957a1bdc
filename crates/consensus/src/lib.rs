//! Proof of Work consensus for powchain.
//!
//! This crate provides:
//! - The work predicate (leading zero bits of the header hash's first word)
//! - Nonce search, with a timestamp bump when the nonce space runs out
//! - Block assembly over a fixed-size transaction batch
//! - Block validation (parent link, Merkle commitment, work) and
//!   transaction signature validation
//!
//! # Example
//!
//! ```rust
//! use powchain_consensus::{BlockProposer, BlockValidator};
//! use powchain_core::{Blake3, Digest, Signature, Transaction};
//!
//! let txs: Vec<Transaction> = (0..2u8)
//!     .map(|i| Transaction::new(vec![i], Signature::default()))
//!     .collect();
//!
//! let mut proposer = BlockProposer::new(2, 0);
//! let (block, _) = proposer.propose_block(Digest::ZERO, txs, 0, 4).unwrap();
//!
//! BlockValidator::validate_full(&Blake3, &block, Digest::ZERO, 2, 4).unwrap();
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{meets_target, search, search_range, BlockProposer, ConsensusError, Solution, MAX_TARGET};
pub use validator::{BlockValidator, TransactionValidator, ValidationError};
