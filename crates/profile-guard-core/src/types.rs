//! Strong type definitions for profile-guard.
//!
//! Keys, addresses and proposal identifiers are newtypes so they cannot be
//! swapped by accident at a call site.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Parse a hex string (with or without `0x`) into a fixed-size array.
pub(crate) fn parse_fixed<const N: usize>(s: &str) -> Result<[u8; N]> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    if bytes.len() != N {
        return Err(CoreError::InvalidLength {
            expected: N,
            got: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// A 20-byte account address.
///
/// Identifies every actor: externally owned signers, the profile itself,
/// the key manager and each module sitting in front of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, `0x` prefix optional.
    pub fn from_hex(s: &str) -> Result<Self> {
        parse_fixed::<20>(s).map(Self)
    }

    /// Decode an address stored as a data value (exactly 20 bytes).
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 20] = slice.try_into().map_err(|_| CoreError::InvalidLength {
            expected: 20,
            got: slice.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte data key addressing one entry of the account store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataKey(pub [u8; 32]);

impl DataKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, `0x` prefix optional.
    pub fn from_hex(s: &str) -> Result<Self> {
        parse_fixed::<32>(s).map(Self)
    }

    /// Whether the key begins with `prefix`.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey(0x{})", self.to_hex())
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for DataKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for DataKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for DataKey {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> std::result::Result<Self, Self::Error> {
        let arr: [u8; 32] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// A 10-byte multisig proposal identifier.
///
/// Occupies the first ten bytes of both proposal record keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub [u8; 10]);

impl ProposalId {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 10]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 10] {
        &self.0
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, `0x` prefix optional.
    pub fn from_hex(s: &str) -> Result<Self> {
        parse_fixed::<10>(s).map(Self)
    }
}

impl fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalId(0x{})", self.to_hex())
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_accepts_prefix() {
        let a = Address::from_hex("0x00000000000000000000000000000000000000aa").unwrap();
        let b = Address::from_hex("00000000000000000000000000000000000000aa").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.0[19], 0xaa);
    }

    #[test]
    fn test_address_display() {
        let a = Address::from_bytes([0xab; 20]);
        assert_eq!(format!("{}", a), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn test_address_from_slice_rejects_wrong_length() {
        let err = Address::from_slice(&[0u8; 32]).unwrap_err();
        assert_eq!(err, CoreError::InvalidLength { expected: 20, got: 32 });
    }

    #[test]
    fn test_data_key_wrong_length() {
        assert!(DataKey::from_hex("0x1234").is_err());
    }

    #[test]
    fn test_data_key_debug() {
        let key = DataKey::from_bytes([0xcd; 32]);
        assert!(format!("{:?}", key).starts_with("DataKey(0xcdcd"));
    }
}
