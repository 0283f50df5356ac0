//! Key codec: deterministic derivation of 32-byte data keys.
//!
//! Four layouts are in use:
//!
//! - **Singleton**: `keccak256(name)`
//! - **Array**: length at `keccak256(name)`, element `i` at
//!   `bytes16(keccak256(name)) ++ uint128_be(i)`
//! - **Address mapping**: a 12-byte prefix followed by a 20-byte address.
//!   Prefixes are either `bytes10(keccak256(first)) ++ 0000` or, when
//!   grouped, `bytes6(keccak256(first)) ++ bytes4(keccak256(second)) ++ 0000`
//! - **Word mapping**: `bytes10(first) ++ 0000 ++ bytes20(second)`
//!
//! Derivation must stay byte-for-byte stable: stored data written by other
//! implementations is read back through these functions.

use crate::crypto::keccak256;
use crate::types::{Address, DataKey};

/// The first 12 bytes of an address-mapped key.
pub type KeyPrefix = [u8; 12];

pub const ADDRESS_PERMISSIONS: &str = "AddressPermissions";
pub const ADDRESS_PERMISSIONS_ARRAY: &str = "AddressPermissions[]";
pub const PERMISSIONS_GROUP: &str = "Permissions";
pub const DAO_PERMISSIONS_GROUP: &str = "DaoPermissions";

pub const UNIVERSAL_RECEIVER_DELEGATE: &str = "LSP1UniversalReceiverDelegate";
pub const SUPPORTED_STANDARDS: &str = "SupportedStandards";
pub const LSP3_UNIVERSAL_PROFILE: &str = "LSP3UniversalProfile";

pub const DAO_METADATA: &str = "DaoMetadataJSON";
pub const DAO_MAJORITY: &str = "Majority";
pub const DAO_PARTICIPATION_RATE: &str = "ParticipationRate";
pub const DAO_MINIMUM_VOTING_DELAY: &str = "MinimumVotingDelay";
pub const DAO_MINIMUM_VOTING_PERIOD: &str = "MinimumVotingPeriod";
pub const DAO_PARTICIPANTS: &str = "DaoParticipants[]";
pub const DAO_CLAIM_NONCE: &str = "DaoPermissionClaimNonce";
pub const DAO_DELEGATEE: &str = "DaoDelegatee";
pub const DAO_DELEGATES: &str = "DaoDelegates[]";

pub const MULTISIG_QUORUM: &str = "MultisigQuorum";
pub const MULTISIG_PARTICIPANTS: &str = "MultisigParticipants[]";
pub const MULTISIG_PROPOSAL_TARGETS: &str = "MultisigProposalTargets[]";
pub const MULTISIG_PROPOSAL_DATAS: &str = "MultisigProposalDatas[]";
pub const MULTISIG_PROPOSAL_NONCE: &str = "MultisigProposalNonce";

/// Multisig member permissions live under a literal prefix: `"AddresMult" ++ 0000`.
pub const MULTISIG_PERMISSIONS_PREFIX: KeyPrefix = *b"AddresMult\0\0";

/// Singleton key: `keccak256(name)`.
pub fn encode_singleton(name: &str) -> DataKey {
    DataKey(keccak256(name.as_bytes()))
}

/// Array length key: `keccak256(name)`, where `name` ends in `[]`.
pub fn encode_array_length(name: &str) -> DataKey {
    encode_singleton(name)
}

/// Array element key: first 16 bytes of the length key, then the index.
pub fn encode_array_element(length_key: &DataKey, index: u128) -> DataKey {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&length_key.0[..16]);
    out[16..].copy_from_slice(&index.to_be_bytes());
    DataKey(out)
}

/// Address-mapped key: `prefix ++ address`.
pub fn encode_address_mapping(prefix: &KeyPrefix, address: &Address) -> DataKey {
    let mut out = [0u8; 32];
    out[..12].copy_from_slice(prefix);
    out[12..].copy_from_slice(&address.0);
    DataKey(out)
}

/// Mapping prefix: `bytes10(keccak256(first)) ++ 0000`.
pub fn mapping_prefix(first: &str) -> KeyPrefix {
    prefix_of_hash(&keccak256(first.as_bytes()))
}

/// Grouped mapping prefix: `bytes6(keccak256(first)) ++ bytes4(keccak256(second)) ++ 0000`.
pub fn grouped_prefix(first: &str, second: &str) -> KeyPrefix {
    let mut out = [0u8; 12];
    out[..6].copy_from_slice(&keccak256(first.as_bytes())[..6]);
    out[6..10].copy_from_slice(&keccak256(second.as_bytes())[..4]);
    out
}

/// Word mapping key: `bytes10(first) ++ 0000 ++ bytes20(second)`.
pub fn word_mapping(first: &[u8; 10], second: &[u8; 20]) -> DataKey {
    let mut out = [0u8; 32];
    out[..10].copy_from_slice(first);
    out[12..].copy_from_slice(second);
    DataKey(out)
}

/// First 20 bytes of `keccak256(name)`, the second half of a word mapping.
pub fn name_word(name: &str) -> [u8; 20] {
    let hash = keccak256(name.as_bytes());
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[..20]);
    out
}

fn prefix_of_hash(hash: &[u8; 32]) -> KeyPrefix {
    let mut out = [0u8; 12];
    out[..10].copy_from_slice(&hash[..10]);
    out
}

/// An array laid out under one length key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayKey {
    length: DataKey,
}

impl ArrayKey {
    /// Array named `name` (conventionally ending in `[]`).
    pub fn named(name: &str) -> Self {
        Self {
            length: encode_array_length(name),
        }
    }

    /// Array whose length key was derived elsewhere.
    pub const fn from_length_key(length: DataKey) -> Self {
        Self { length }
    }

    /// The key holding the array length.
    pub fn length_key(&self) -> DataKey {
        self.length
    }

    /// The key of element `index`.
    pub fn element(&self, index: u128) -> DataKey {
        encode_array_element(&self.length, index)
    }

    /// Whether `key` addresses an element of this array.
    pub fn is_element(&self, key: &DataKey) -> bool {
        key.0[..16] == self.length.0[..16] && *key != self.length
    }

    /// Prefix of the reverse address-to-index map: `bytes10(length key) ++ 0000`.
    pub fn index_prefix(&self) -> KeyPrefix {
        prefix_of_hash(&self.length.0)
    }
}

/// `AddressPermissions[]`: controllers registered on the profile.
pub fn address_permissions_array() -> ArrayKey {
    ArrayKey::named(ADDRESS_PERMISSIONS_ARRAY)
}

/// `AddressPermissions:Permissions:<address>` prefix (controller masks).
pub fn controller_permissions_prefix() -> KeyPrefix {
    grouped_prefix(ADDRESS_PERMISSIONS, PERMISSIONS_GROUP)
}

/// `AddressPermissions:DaoPermissions:<address>` prefix (DAO masks).
pub fn dao_permissions_prefix() -> KeyPrefix {
    grouped_prefix(ADDRESS_PERMISSIONS, DAO_PERMISSIONS_GROUP)
}

/// Every `AddressPermissions:*` mapping shares these six bytes.
pub fn address_permissions_group() -> [u8; 6] {
    let mut out = [0u8; 6];
    out.copy_from_slice(&keccak256(ADDRESS_PERMISSIONS.as_bytes())[..6]);
    out
}

/// `SupportedStandards:LSP3UniversalProfile`.
pub fn lsp3_supported_standard_key() -> DataKey {
    let mut first = [0u8; 10];
    first.copy_from_slice(&keccak256(SUPPORTED_STANDARDS.as_bytes())[..10]);
    word_mapping(&first, &name_word(LSP3_UNIVERSAL_PROFILE))
}

/// The marker value stored under [`lsp3_supported_standard_key`].
pub fn lsp3_supported_standard_value() -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&keccak256(LSP3_UNIVERSAL_PROFILE.as_bytes())[..4]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hex: &str) -> DataKey {
        DataKey::from_hex(hex).unwrap()
    }

    #[test]
    fn test_singletons() {
        assert_eq!(
            encode_singleton(UNIVERSAL_RECEIVER_DELEGATE),
            key("0x0cfc51aec37c55a4d0b1a65c6255c4bf2fbdf6277f3cc0730c45b828b6db8b47")
        );
        assert_eq!(
            encode_singleton(MULTISIG_QUORUM),
            key("0x47499aa724781173ffff2a8a82c6223b88e1a838d32bb91a9ff9c9c0b8c8759b")
        );
    }

    #[test]
    fn test_array_element() {
        let array = address_permissions_array();
        assert_eq!(
            array.element(1),
            key("0xdf30dba06db6a30e65354d9a64c6098600000000000000000000000000000001")
        );
        assert!(array.is_element(&array.element(7)));
        assert!(!array.is_element(&array.length_key()));
    }

    #[test]
    fn test_grouped_prefixes() {
        assert_eq!(hex::encode(controller_permissions_prefix()), "4b80742de2bf82acb3630000");
        assert_eq!(hex::encode(dao_permissions_prefix()), "4b80742de2bfb3cc0e490000");
    }

    #[test]
    fn test_index_prefix_matches_mapping_prefix() {
        let participants = ArrayKey::named(DAO_PARTICIPANTS);
        assert_eq!(participants.index_prefix(), mapping_prefix(DAO_PARTICIPANTS));
        assert_eq!(hex::encode(participants.index_prefix()), "f7f9c7410dd493d79ebd0000");
    }

    #[test]
    fn test_address_mapping() {
        let addr = Address::from_bytes([0x11; 20]);
        let k = encode_address_mapping(&MULTISIG_PERMISSIONS_PREFIX, &addr);
        assert_eq!(&k.0[..12], b"AddresMult\0\0");
        assert_eq!(&k.0[12..], &[0x11; 20]);
    }

    #[test]
    fn test_lsp3_marker() {
        assert_eq!(
            lsp3_supported_standard_key(),
            key("0xeafec4d89fa9619884b60000abe425d64acd861a49b8ddf5c0b6962110481f38")
        );
        assert_eq!(lsp3_supported_standard_value(), [0xab, 0xe4, 0x25, 0xd6]);
    }
}
