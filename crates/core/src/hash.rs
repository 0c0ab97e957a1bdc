//! Digest type and the hash-function seam used by every component.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit digest.
pub type H256 = [u8; 32];

/// Number of 64-bit words in a digest.
pub const DIGEST_WORDS: usize = 4;

/// Fixed-width output of the hash function.
///
/// A digest is also viewed as four 64-bit words. Word `i` is bytes
/// `8i..8i + 8` read big-endian, so word 0 is the most-significant word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Digest(pub H256);

impl Digest {
    /// The zero digest (all zeros).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new digest from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// The `index`-th 64-bit word.
    ///
    /// # Panics
    ///
    /// Panics if `index >= DIGEST_WORDS`.
    pub fn word(&self, index: usize) -> u64 {
        let start = index * 8;
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.0[start..start + 8]);
        u64::from_be_bytes(word)
    }

    /// All four words, most-significant first.
    pub fn words(&self) -> [u64; DIGEST_WORDS] {
        [self.word(0), self.word(1), self.word(2), self.word(3)]
    }

    /// Count of most-significant zero bits in word 0.
    ///
    /// This is the proof-of-work metric: only the first word is inspected,
    /// so the result is at most 64.
    pub fn leading_zero_bits(&self) -> u32 {
        self.word(0).leading_zeros()
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x{})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<H256> for Digest {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl From<Digest> for H256 {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A stable hash function producing a [`Digest`].
///
/// Implementations must be pure: the same input always yields the same
/// output. Everything that hashes (headers, Merkle nodes, the PRNG, the
/// signature challenge) goes through this trait.
pub trait Hasher {
    /// Hash a byte string.
    fn digest(&self, data: &[u8]) -> Digest;

    /// Hash several byte strings as if they were concatenated.
    fn digest_parts(&self, parts: &[&[u8]]) -> Digest {
        self.digest(&parts.concat())
    }
}

/// Blake3 as a 256-bit [`Hasher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl Hasher for Blake3 {
    fn digest(&self, data: &[u8]) -> Digest {
        Digest(blake3::hash(data).into())
    }

    fn digest_parts(&self, parts: &[&[u8]]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Digest(hasher.finalize().into())
    }
}

/// Hash arbitrary data using Blake3.
pub fn hash(data: &[u8]) -> Digest {
    Blake3.digest(data)
}
