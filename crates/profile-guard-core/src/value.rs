//! Codecs for the values stored next to the keys.
//!
//! Counters and indices are 32-byte big-endian unsigned integers; member
//! entries are bare 20-byte addresses. The empty value always means unset.

use bytes::Bytes;

use crate::error::{CoreError, Result};
use crate::types::Address;

/// Encode an unsigned integer as a 32-byte big-endian word.
pub fn encode_uint(value: u128) -> Bytes {
    let mut out = [0u8; 32];
    out[16..].copy_from_slice(&value.to_be_bytes());
    Bytes::copy_from_slice(&out)
}

/// Decode a big-endian unsigned integer of up to 32 bytes.
///
/// The empty value decodes to zero. Values wider than 128 bits are rejected.
pub fn decode_uint(value: &[u8]) -> Result<u128> {
    if value.len() > 32 {
        return Err(CoreError::InvalidLength {
            expected: 32,
            got: value.len(),
        });
    }
    let significant = value.len().saturating_sub(16);
    if value[..significant].iter().any(|b| *b != 0) {
        return Err(CoreError::IntegerOverflow { bits: 128 });
    }
    let tail = &value[significant..];
    let mut be = [0u8; 16];
    be[16 - tail.len()..].copy_from_slice(tail);
    Ok(u128::from_be_bytes(be))
}

/// Encode an address value (20 bytes).
pub fn encode_address(address: &Address) -> Bytes {
    Bytes::copy_from_slice(&address.0)
}

/// Decode an optional address value; the empty value is `None`.
pub fn decode_address(value: &[u8]) -> Result<Option<Address>> {
    if value.is_empty() {
        return Ok(None);
    }
    Address::from_slice(value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_roundtrip_width() {
        let v = encode_uint(3);
        assert_eq!(v.len(), 32);
        assert_eq!(v[31], 3);
        assert_eq!(decode_uint(&v).unwrap(), 3);
    }

    #[test]
    fn test_uint_short_values() {
        assert_eq!(decode_uint(&[]).unwrap(), 0);
        assert_eq!(decode_uint(&[0x32]).unwrap(), 50);
        assert_eq!(decode_uint(&[0x01, 0x00]).unwrap(), 256);
    }

    #[test]
    fn test_uint_overflow() {
        let mut wide = [0u8; 32];
        wide[0] = 1;
        assert_eq!(
            decode_uint(&wide).unwrap_err(),
            CoreError::IntegerOverflow { bits: 128 }
        );
        assert!(decode_uint(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_address_values() {
        assert_eq!(decode_address(&[]).unwrap(), None);
        let a = Address::from_bytes([7; 20]);
        assert_eq!(decode_address(&encode_address(&a)).unwrap(), Some(a));
        assert!(decode_address(&[1, 2, 3]).is_err());
    }
}
