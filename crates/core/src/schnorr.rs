//! Key-prefixed Schnorr signatures over a prime-order subgroup of Z_p^*.
//!
//! With generator `g` of order `q` modulo `p`:
//!
//! ```text
//! keygen:  x <- [1, q),  y = g^x mod p
//! sign:    k <- [1, q),  r = g^k mod p
//!          e = H(y || r || m) mod q
//!          s = (k + e*x) mod q          signature = (e, s)
//! verify:  r' = g^s * y^(-e) mod p,  accept iff H(y || r' || m) mod q == e
//! ```
//!
//! Group elements are hashed as fixed-width big-endian integers (the byte
//! width of `p`), digests are read back as big-endian integers.
//!
//! Signer and verifier must use the same [`GroupParams`]. A mismatch is not
//! detected; verification just fails (or, worse, succeeds for the wrong
//! group), so callers share one `Arc<GroupParams>`.

use crate::concat::Concatenator;
use crate::hash::Hasher;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use thiserror::Error;

// GOST R 34.10-94 test parameters: 512-bit p, 256-bit q, generator of order q.
const DEFAULT_P: &str = "EE8172AE8996608FB69359B89EB82A69854510E2977A4D63BC97322CE5DC3386\
                         EA0A12B343E9190F23177539845839786BB0C345D165976EF2195EC9B1C379E3";
const DEFAULT_Q: &str = "98915E7EC8265EDFCDA31E88F24809DDB064BDC7285DD50D7289F0AC6F49DD2D";
const DEFAULT_G: &str = "9E96031500C8774A869582D4AFDE2127AFAD2538B4B6270A6F7C8837B50D50F2\
                         06755984A49E509304D648BE2AB5AAB18EBE2CD46AC3D8495B142AA6CE23E21C";

/// Errors that can occur during signature operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid group parameters: {0}")]
    InvalidGroupParams(&'static str),
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid signature encoding")]
    InvalidSignature,
}

pub type Result<T> = std::result::Result<T, CryptoError>;

fn parse_hex(s: &str) -> Option<BigUint> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    BigUint::parse_bytes(s.as_bytes(), 16)
}

fn to_fixed_be(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut out = vec![0u8; width.saturating_sub(bytes.len())];
    out.extend_from_slice(&bytes);
    out
}

mod hex_biguint {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{:x}", value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid hex integer"))
    }
}

/// Public group parameters: modulus `p`, subgroup order `q`, generator `g`.
#[derive(Clone, PartialEq, Eq)]
pub struct GroupParams {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl GroupParams {
    /// Validate and wrap group parameters.
    ///
    /// Checks that `q` divides `p - 1` and that `g` is a non-trivial element
    /// with `g^q = 1 mod p`. Primality is not checked.
    pub fn new(p: BigUint, q: BigUint, g: BigUint) -> Result<Self> {
        let one = BigUint::one();
        if p <= BigUint::from(3u32) {
            return Err(CryptoError::InvalidGroupParams("modulus too small"));
        }
        if q <= one || q >= p {
            return Err(CryptoError::InvalidGroupParams("order out of range"));
        }
        if !((&p - &one) % &q).is_zero() {
            return Err(CryptoError::InvalidGroupParams("order does not divide p - 1"));
        }
        if g <= one || g >= p {
            return Err(CryptoError::InvalidGroupParams("generator out of range"));
        }
        if g.modpow(&q, &p) != one {
            return Err(CryptoError::InvalidGroupParams("generator order is not q"));
        }
        Ok(Self { p, q, g })
    }

    /// Parse parameters from hex strings (with or without 0x prefix).
    pub fn from_hex(p: &str, q: &str, g: &str) -> Result<Self> {
        let parse = |s: &str| parse_hex(s).ok_or(CryptoError::InvalidGroupParams("bad hex"));
        Self::new(parse(p)?, parse(q)?, parse(g)?)
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Byte width of a group element (width of `p`).
    pub fn element_len(&self) -> usize {
        ((self.p.bits() + 7) / 8) as usize
    }

    /// Byte width of a scalar (width of `q`).
    pub fn scalar_len(&self) -> usize {
        ((self.q.bits() + 7) / 8) as usize
    }

    /// Fixed-width big-endian encoding of a group element.
    pub fn encode_element(&self, element: &BigUint) -> Vec<u8> {
        to_fixed_be(element, self.element_len())
    }

    /// Fixed-width big-endian encoding of a scalar.
    pub fn encode_scalar(&self, scalar: &BigUint) -> Vec<u8> {
        to_fixed_be(scalar, self.scalar_len())
    }

    /// `H(y || r || message) mod q`, joined by `concat`.
    fn challenge<H: Hasher, C: Concatenator>(
        &self,
        hasher: &H,
        concat: &C,
        public: &BigUint,
        commitment: &BigUint,
        message: &[u8],
    ) -> BigUint {
        let y = self.encode_element(public);
        let r = self.encode_element(commitment);
        let digest = hasher.digest(&concat.concat(&[&y, &r, &message]));
        BigUint::from_bytes_be(digest.as_bytes()) % &self.q
    }
}

impl Default for GroupParams {
    fn default() -> Self {
        Self::from_hex(DEFAULT_P, DEFAULT_Q, DEFAULT_G)
            .expect("built-in group parameters are valid")
    }
}

impl fmt::Debug for GroupParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupParams")
            .field("p_bits", &self.p.bits())
            .field("q_bits", &self.q.bits())
            .finish()
    }
}

/// Source of nonzero scalars modulo `q` (private keys and signing nonces).
pub trait ScalarSource {
    /// Draw a scalar in `[1, q)`.
    fn next_scalar(&mut self, q: &BigUint) -> BigUint;
}

// Draws `scalar_len` bytes per attempt, so a `HashRng` consumes exactly one
// digest per attempt for a 256-bit q.
impl<R: RngCore + ?Sized> ScalarSource for R {
    fn next_scalar(&mut self, q: &BigUint) -> BigUint {
        let len = ((q.bits() + 7) / 8).max(1) as usize;
        let mut buf = vec![0u8; len];
        loop {
            self.fill_bytes(&mut buf);
            let x = BigUint::from_bytes_be(&buf) % q;
            if !x.is_zero() {
                return x;
            }
        }
    }
}

/// Secret scalar `x`. Never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(BigUint);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Public group element `y = g^x mod p`; also used as the sender address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "hex_biguint")] BigUint);

impl PublicKey {
    /// Wrap a raw group element. No validation happens here; `verify`
    /// rejects elements outside the subgroup.
    pub fn from_element(element: BigUint) -> Self {
        Self(element)
    }

    pub fn element(&self) -> &BigUint {
        &self.0
    }

    /// Hex string with 0x prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        parse_hex(s).map(Self).ok_or(CryptoError::InvalidPublicKey)
    }

    /// Verify a signature against this public key.
    pub fn verify<H: Hasher, C: Concatenator>(
        &self,
        hasher: &H,
        concat: &C,
        params: &GroupParams,
        message: &[u8],
        signature: &Signature,
    ) -> bool {
        verify(hasher, concat, params, message, signature, self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "PublicKey({})", &hex[..hex.len().min(18)])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A signature `(e, s)`: challenge and response, both modulo `q`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "hex_biguint")]
    e: BigUint,
    #[serde(with = "hex_biguint")]
    s: BigUint,
}

impl Signature {
    pub fn new(e: BigUint, s: BigUint) -> Self {
        Self { e, s }
    }

    /// The challenge.
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// The response.
    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// `e || s`, each padded to the scalar width of `params`.
    pub fn to_bytes(&self, params: &GroupParams) -> Vec<u8> {
        let mut out = params.encode_scalar(&self.e);
        out.extend(params.encode_scalar(&self.s));
        out
    }

    /// Inverse of [`Signature::to_bytes`].
    pub fn from_bytes(params: &GroupParams, bytes: &[u8]) -> Result<Self> {
        let width = params.scalar_len();
        if bytes.len() != 2 * width {
            return Err(CryptoError::InvalidSignature);
        }
        let (e, s) = bytes.split_at(width);
        Ok(Self {
            e: BigUint::from_bytes_be(e),
            s: BigUint::from_bytes_be(s),
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(e: 0x{:x}, s: 0x{:x})", self.e, self.s)
    }
}

/// A private/public key pair.
#[derive(Clone)]
pub struct Keypair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl Keypair {
    /// Draw `x` from `source` and derive `y = g^x mod p`.
    pub fn generate<S: ScalarSource + ?Sized>(params: &GroupParams, source: &mut S) -> Self {
        let x = source.next_scalar(params.q());
        let y = params.g().modpow(&x, params.p());
        Self {
            private_key: PrivateKey(x),
            public_key: PublicKey(y),
        }
    }

    /// Build a keypair from an explicit private scalar in `[1, q)`.
    pub fn from_private(params: &GroupParams, x: BigUint) -> Result<Self> {
        if x.is_zero() || &x >= params.q() {
            return Err(CryptoError::InvalidPrivateKey);
        }
        let y = params.g().modpow(&x, params.p());
        Ok(Self {
            private_key: PrivateKey(x),
            public_key: PublicKey(y),
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign a message, drawing the nonce from `source`.
    pub fn sign<H: Hasher, C: Concatenator, S: ScalarSource + ?Sized>(
        &self,
        hasher: &H,
        concat: &C,
        params: &GroupParams,
        message: &[u8],
        source: &mut S,
    ) -> Signature {
        sign(hasher, concat, params, self, message, source)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Produce a key-prefixed Schnorr signature over `message`.
///
/// `concat` joins the challenge input and must match the verifier's.
pub fn sign<H: Hasher, C: Concatenator, S: ScalarSource + ?Sized>(
    hasher: &H,
    concat: &C,
    params: &GroupParams,
    keypair: &Keypair,
    message: &[u8],
    source: &mut S,
) -> Signature {
    let q = params.q();
    let k = source.next_scalar(q);
    let r = params.g().modpow(&k, params.p());
    let e = params.challenge(hasher, concat, &keypair.public_key.0, &r, message);
    let s = (k + &e * &keypair.private_key.0) % q;
    Signature { e, s }
}

/// Verify a signature. Malformed input yields `false`, never a panic.
pub fn verify<H: Hasher, C: Concatenator>(
    hasher: &H,
    concat: &C,
    params: &GroupParams,
    message: &[u8],
    signature: &Signature,
    public_key: &PublicKey,
) -> bool {
    let (p, q) = (params.p(), params.q());
    let one = BigUint::one();
    let y = &public_key.0;

    if &signature.e >= q || &signature.s >= q {
        return false;
    }
    if y <= &one || y >= p || y.modpow(q, p) != one {
        return false;
    }

    // y has order q, so y^(-e) = y^(q - e).
    let y_inv_e = y.modpow(&(q - &signature.e), p);
    let r = (params.g().modpow(&signature.s, p) * y_inv_e) % p;
    let e = params.challenge(hasher, concat, y, &r, message);

    let expected = params.encode_scalar(&signature.e);
    let actual = params.encode_scalar(&e);
    bool::from(expected.as_slice().ct_eq(actual.as_slice()))
}
