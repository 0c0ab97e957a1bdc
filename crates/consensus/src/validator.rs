//! Transaction and block validation rules.
//!
//! Blocks are checked against their parent hash, their Merkle commitment and
//! their proof of work. Transactions are checked against the claimed sender's
//! public key.

use crate::pow::meets_target;
use powchain_core::{Block, Concatenator, Digest, GroupParams, Hasher, PublicKey, Transaction};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("transaction signature verification failed")]
    InvalidSignature,

    #[error("block prev hash mismatch (expected {expected}, got {got})")]
    InvalidLinkage { expected: Digest, got: Digest },

    #[error("block transactions do not match the committed root")]
    InvalidCommitment,

    #[error("block target mismatch (expected {expected}, got {got})")]
    TargetMismatch { expected: u32, got: u32 },

    #[error("insufficient work (target {target} leading zero bits, got {got})")]
    InsufficientWork { target: u32, got: u32 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Transaction validator.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Verify the transaction was signed by `sender`.
    pub fn validate_signature<H: Hasher, C: Concatenator>(
        hasher: &H,
        concat: &C,
        params: &GroupParams,
        tx: &Transaction,
        sender: &PublicKey,
    ) -> Result<()> {
        if tx.verify(hasher, concat, params, sender) {
            Ok(())
        } else {
            Err(ValidationError::InvalidSignature)
        }
    }
}

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Validate the block points at `parent_hash`.
    pub fn validate_linkage(block: &Block, parent_hash: Digest) -> Result<()> {
        if block.header.prev != parent_hash {
            return Err(ValidationError::InvalidLinkage {
                expected: parent_hash,
                got: block.header.prev,
            });
        }
        Ok(())
    }

    /// Validate the block carries exactly `batch_size` transactions and that
    /// its root commits to them in order.
    pub fn validate_commitment<H: Hasher>(
        hasher: &H,
        block: &Block,
        batch_size: usize,
    ) -> Result<()> {
        if block.tx_count() != batch_size || !block.verify_txn_root(hasher) {
            return Err(ValidationError::InvalidCommitment);
        }
        Ok(())
    }

    /// Validate the header uses `target` and its hash meets it.
    pub fn validate_work<H: Hasher>(hasher: &H, block: &Block, target: u32) -> Result<()> {
        if block.header.target != target {
            return Err(ValidationError::TargetMismatch {
                expected: target,
                got: block.header.target,
            });
        }

        let hash = block.hash_with(hasher);
        if !meets_target(&hash, target) {
            return Err(ValidationError::InsufficientWork {
                target,
                got: hash.leading_zero_bits(),
            });
        }
        Ok(())
    }

    /// Full block validation (linkage + commitment + work).
    pub fn validate_full<H: Hasher>(
        hasher: &H,
        block: &Block,
        parent_hash: Digest,
        batch_size: usize,
        target: u32,
    ) -> Result<()> {
        Self::validate_linkage(block, parent_hash)?;
        Self::validate_commitment(hasher, block, batch_size)?;
        Self::validate_work(hasher, block, target)?;
        Ok(())
    }
}
