//! Deterministic byte concatenation of heterogeneous values for hashing.
//!
//! Fixed-size values contribute their literal byte image (integers are
//! little-endian on every platform), variable-length values contribute their
//! elements in order. Nothing is delimited, so `concat(&[&a, &b])` is exactly
//! `a`'s bytes followed by `b`'s bytes.

use crate::hash::Digest;

/// A value that can append its byte image to a buffer.
pub trait Encode {
    /// Append this value's bytes to `out`.
    fn encode_to(&self, out: &mut Vec<u8>);

    /// Number of bytes [`Encode::encode_to`] will append.
    fn encoded_len(&self) -> usize;
}

macro_rules! impl_encode_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode_to(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn encoded_len(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }
            }
        )*
    };
}

impl_encode_int!(u8, u16, u32, u64, i32, i64);

impl<const N: usize> Encode for [u8; N] {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn encoded_len(&self) -> usize {
        N
    }
}

impl Encode for Digest {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn encoded_len(&self) -> usize {
        32
    }
}

impl Encode for [u8] {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn encoded_len(&self) -> usize {
        self.len()
    }
}

impl Encode for Vec<u8> {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }

    fn encoded_len(&self) -> usize {
        self.len()
    }
}

impl Encode for str {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn encoded_len(&self) -> usize {
        self.len()
    }
}

impl Encode for String {
    fn encode_to(&self, out: &mut Vec<u8>) {
        self.as_str().encode_to(out);
    }

    fn encoded_len(&self) -> usize {
        self.len()
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to(&self, out: &mut Vec<u8>) {
        (**self).encode_to(out);
    }

    fn encoded_len(&self) -> usize {
        (**self).encoded_len()
    }
}

/// Strategy for turning an ordered list of values into one byte string.
pub trait Concatenator {
    /// Concatenate `parts` in argument order.
    fn concat(&self, parts: &[&dyn Encode]) -> Vec<u8>;
}

/// Plain back-to-back concatenation with no delimiters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnifiedConcat;

impl Concatenator for UnifiedConcat {
    fn concat(&self, parts: &[&dyn Encode]) -> Vec<u8> {
        let len = parts.iter().map(|p| p.encoded_len()).sum();
        let mut out = Vec::with_capacity(len);
        for part in parts {
            part.encode_to(&mut out);
        }
        out
    }
}

/// Concatenation where each part is preceded by its length as a
/// little-endian `u64`.
///
/// Unlike [`UnifiedConcat`], two different splits of the same bytes never
/// produce the same output. This is a powchain extension: nothing selects it
/// by default, and hashes produced with it do not match the unified layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthPrefixedConcat;

impl Concatenator for LengthPrefixedConcat {
    fn concat(&self, parts: &[&dyn Encode]) -> Vec<u8> {
        let len = parts.iter().map(|p| 8 + p.encoded_len()).sum();
        let mut out = Vec::with_capacity(len);
        for part in parts {
            (part.encoded_len() as u64).encode_to(&mut out);
            part.encode_to(&mut out);
        }
        out
    }
}

/// Concatenate with [`UnifiedConcat`].
pub fn concat(parts: &[&dyn Encode]) -> Vec<u8> {
    UnifiedConcat.concat(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size_values_are_memory_images() {
        let bytes = concat(&[&1u32, &0x0102_0304_0506_0708u64, &0xABu8]);
        assert_eq!(
            bytes,
            vec![1, 0, 0, 0, 8, 7, 6, 5, 4, 3, 2, 1, 0xAB]
        );
    }

    #[test]
    fn test_variable_length_values_copy_elements_in_order() {
        let payload: &[u8] = b"xyz";
        let bytes = concat(&[&payload, &"ab", &vec![9u8, 8]]);
        assert_eq!(bytes, b"xyzab\x09\x08".to_vec());
    }

    #[test]
    fn test_digest_then_counter() {
        let d = Digest([7u8; 32]);
        let bytes = concat(&[&d, &3u64]);
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[..32], &[7u8; 32]);
        assert_eq!(&bytes[32..], &3u64.to_le_bytes());
    }

    #[test]
    fn test_order_is_preserved() {
        assert_ne!(concat(&[&1u8, &2u8]), concat(&[&2u8, &1u8]));
    }

    #[test]
    fn test_empty_input() {
        assert!(concat(&[]).is_empty());
        assert!(concat(&[&""]).is_empty());
    }

    #[test]
    fn test_length_prefixed_disambiguates_splits() {
        let a = LengthPrefixedConcat.concat(&[&"ab", &"c"]);
        let b = LengthPrefixedConcat.concat(&[&"a", &"bc"]);
        assert_ne!(a, b);
        assert_eq!(concat(&[&"ab", &"c"]), concat(&[&"a", &"bc"]));
        assert_eq!(a.len(), 8 + 2 + 8 + 1);
    }
}
