//! Configuration for deploying the DAO and multisig modules.
//!
//! Settings are plain serde structs, usually loaded from JSON. Addresses
//! and masks are written as `0x`-prefixed hex strings.

use profile_guard_core::{Address, BitMask};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// An initial member and the mask it starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    #[serde(with = "hex_address")]
    pub address: Address,
    #[serde(with = "hex_mask")]
    pub permissions: BitMask,
}

impl MemberConfig {
    pub fn new(address: Address, permissions: BitMask) -> Self {
        Self { address, permissions }
    }
}

/// DAO governance parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaoSettings {
    /// Metadata document (usually a link to JSON).
    pub metadata: String,
    /// Percentage of votes needed to pass.
    pub majority: u8,
    /// Percentage of members that must vote.
    pub participation_rate: u8,
    /// Seconds between proposal and voting start.
    pub minimum_voting_delay: u128,
    /// Seconds voting stays open.
    pub minimum_voting_period: u128,
    pub members: Vec<MemberConfig>,
}

impl Default for DaoSettings {
    fn default() -> Self {
        Self {
            metadata: String::new(),
            majority: 50,
            participation_rate: 50,
            minimum_voting_delay: 60,
            minimum_voting_period: 60,
            members: Vec::new(),
        }
    }
}

impl DaoSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        check_percentage("majority", self.majority)?;
        check_percentage("participation_rate", self.participation_rate)?;
        check_unique(&self.members)
    }
}

/// Multisig parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultisigSettings {
    /// Percentage of members whose approval executes a proposal.
    pub quorum: u8,
    pub members: Vec<MemberConfig>,
}

impl Default for MultisigSettings {
    fn default() -> Self {
        Self {
            quorum: 50,
            members: Vec::new(),
        }
    }
}

impl MultisigSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        check_percentage("quorum", self.quorum)?;
        check_unique(&self.members)
    }
}

fn check_percentage(name: &str, value: u8) -> Result<()> {
    if value > 100 {
        return Err(ProfileError::InvalidConfig(format!("{} must be at most 100, got {}", name, value)));
    }
    Ok(())
}

fn check_unique(members: &[MemberConfig]) -> Result<()> {
    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|m| m.address == member.address) {
            return Err(ProfileError::InvalidConfig(format!("duplicate member {}", member.address)));
        }
    }
    Ok(())
}

mod hex_address {
    use profile_guard_core::Address;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&address.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = String::deserialize(d)?;
        Address::from_hex(&s).map_err(D::Error::custom)
    }
}

mod hex_mask {
    use profile_guard_core::BitMask;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mask: &BitMask, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&mask.to_string())
    }

    /// Accepts any width up to 32 bytes, left-padded.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BitMask, D::Error> {
        let s = String::deserialize(d)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        if digits.len() > 64 {
            return Err(D::Error::custom("mask wider than 32 bytes"));
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(padded).map_err(D::Error::custom)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(BitMask::from_bytes(out))
    }
}
