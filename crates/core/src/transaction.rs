//! Signed opaque-payload transactions.

use crate::concat::Concatenator;
use crate::hash::{Blake3, Digest, Hasher};
use crate::schnorr::{GroupParams, PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// A transaction: opaque payload bytes plus a signature over them.
///
/// Immutable once built. Two transactions with the same payload share a
/// hash, and the ledger admits a given hash at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Raw payload.
    #[serde(with = "hex::serde")]
    payload: Vec<u8>,
    /// Signature over `payload`.
    signature: Signature,
}

impl Transaction {
    /// Create a transaction from a payload and its signature.
    pub fn new(payload: Vec<u8>, signature: Signature) -> Self {
        Self { payload, signature }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Blake3 digest of the payload. This is the Merkle leaf.
    pub fn hash(&self) -> Digest {
        self.hash_with(&Blake3)
    }

    /// Digest of the payload under an explicit hasher.
    pub fn hash_with<H: Hasher>(&self, hasher: &H) -> Digest {
        hasher.digest(&self.payload)
    }

    /// Check the signature against a claimed sender.
    pub fn verify<H: Hasher, C: Concatenator>(
        &self,
        hasher: &H,
        concat: &C,
        params: &GroupParams,
        sender: &PublicKey,
    ) -> bool {
        sender.verify(hasher, concat, params, &self.payload, &self.signature)
    }

    /// Split into payload and signature.
    pub fn into_parts(self) -> (Vec<u8>, Signature) {
        (self.payload, self.signature)
    }
}
