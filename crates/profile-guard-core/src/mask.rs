//! 256-bit permission bitmasks.
//!
//! Stored big-endian in 32 bytes, exactly as they appear in the account
//! store. An unset value decodes to the zero mask.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use bytes::Bytes;

use crate::error::{CoreError, Result};

/// A 32-byte permission bitmask, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitMask(pub [u8; 32]);

impl BitMask {
    /// No permissions.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Every bit set.
    pub const ALL: Self = Self([0xff; 32]);

    /// Build a mask from a small integer (occupies the low 16 bytes).
    pub const fn from_u128(value: u128) -> Self {
        let be = value.to_be_bytes();
        let mut out = [0u8; 32];
        let mut i = 0;
        while i < 16 {
            out[16 + i] = be[i];
            i += 1;
        }
        Self(out)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode a stored permission value.
    ///
    /// The empty value is the zero mask; anything else must be 32 bytes.
    pub fn from_value(value: &[u8]) -> Result<Self> {
        match value.len() {
            0 => Ok(Self::ZERO),
            32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(value);
                Ok(Self(arr))
            }
            got => Err(CoreError::InvalidLength { expected: 32, got }),
        }
    }

    /// Encode for storage: 32 bytes, or the empty value for the zero mask.
    pub fn to_value(&self) -> Bytes {
        if self.is_zero() {
            Bytes::new()
        } else {
            Bytes::copy_from_slice(&self.0)
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// `(self & required) == required`.
    pub fn contains(&self, required: &BitMask) -> bool {
        (*self & *required) == *required
    }

    /// Whether any bit of `other` is present.
    pub fn intersects(&self, other: &BitMask) -> bool {
        !(*self & *other).is_zero()
    }

    /// Bits of `self` not in `other`.
    pub fn without(&self, other: &BitMask) -> BitMask {
        *self & !*other
    }

    /// The low 128 bits, for diagnostics.
    pub fn low_u128(&self) -> u128 {
        let mut be = [0u8; 16];
        be.copy_from_slice(&self.0[16..]);
        u128::from_be_bytes(be)
    }

    /// Iterate over each set bit as a single-bit mask, lowest first.
    pub fn bits(&self) -> impl Iterator<Item = BitMask> + '_ {
        (0..256usize).filter_map(move |bit| {
            let byte = 31 - bit / 8;
            let flag = 1u8 << (bit % 8);
            if self.0[byte] & flag != 0 {
                let mut single = [0u8; 32];
                single[byte] = flag;
                Some(BitMask(single))
            } else {
                None
            }
        })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl BitAnd for BitMask {
    type Output = BitMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] & rhs.0[i];
        }
        BitMask(out)
    }
}

impl BitOr for BitMask {
    type Output = BitMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] | rhs.0[i];
        }
        BitMask(out)
    }
}

impl Not for BitMask {
    type Output = BitMask;

    fn not(self) -> Self::Output {
        let mut out = self.0;
        for byte in out.iter_mut() {
            *byte = !*byte;
        }
        BitMask(out)
    }
}

impl BitAndAssign for BitMask {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

impl BitOrAssign for BitMask {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl From<u128> for BitMask {
    fn from(value: u128) -> Self {
        BitMask::from_u128(value)
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        let trimmed = hex.trim_start_matches('0');
        write!(f, "BitMask(0x{})", if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl fmt::Display for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_u128_layout() {
        let mask = BitMask::from_u128(0x7fbf);
        assert_eq!(mask.0[30], 0x7f);
        assert_eq!(mask.0[31], 0xbf);
        assert!(mask.0[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_remove_bits() {
        let mask = BitMask::from_u128(0x0f);
        assert_eq!(mask.without(&BitMask::from_u128(0x03)), BitMask::from_u128(0x0c));
    }

    #[test]
    fn test_value_encoding() {
        assert!(BitMask::ZERO.to_value().is_empty());
        assert_eq!(BitMask::from_value(&[]).unwrap(), BitMask::ZERO);

        let mask = BitMask::from_u128(0x0e);
        let value = mask.to_value();
        assert_eq!(value.len(), 32);
        assert_eq!(BitMask::from_value(&value).unwrap(), mask);
    }

    #[test]
    fn test_value_wrong_length() {
        assert!(BitMask::from_value(&[0x01]).is_err());
    }

    #[test]
    fn test_bits_iteration() {
        let bits: Vec<u128> = BitMask::from_u128(0b1010_0001)
            .bits()
            .map(|b| b.low_u128())
            .collect();
        assert_eq!(bits, vec![0x01, 0x20, 0x80]);
    }

    #[test]
    fn test_debug_is_trimmed() {
        assert_eq!(format!("{:?}", BitMask::from_u128(0x7f)), "BitMask(0x7f)");
        assert_eq!(format!("{:?}", BitMask::ZERO), "BitMask(0x0)");
    }

    proptest! {
        #[test]
        fn test_contains_matches_and(held in any::<u128>(), required in any::<u128>()) {
            let m = BitMask::from_u128(held);
            let r = BitMask::from_u128(required);
            prop_assert_eq!(m.contains(&r), held & required == required);
        }
    }
}
