//! Golden key vectors.
//!
//! Storage keys other tooling must agree on. Each vector derives a key
//! through the codec and pins the expected 32 bytes; a mismatch means the
//! on-disk layout changed.

use profile_guard::multisig::proposal_keys;
use profile_guard::dao::delegates::delegatee_key;
use profile_guard_core::keys::{self, ArrayKey};
use profile_guard_core::{Address, DataKey, ProposalId};
use profile_guard_perms::PermissionTable;

/// A golden vector for a derived storage key.
#[derive(Debug, Clone)]
pub struct KeyVector {
    /// Vector name
    pub name: &'static str,
    /// Description of what this vector tests
    pub description: &'static str,
    /// Derives the key under test
    pub derive: fn() -> DataKey,
    /// Expected key as hex (no prefix)
    pub expected: &'static str,
}

impl KeyVector {
    /// Derive the key and compare it against the pinned bytes.
    pub fn verify(&self) -> Result<(), String> {
        let got = (self.derive)().to_hex();
        if got == self.expected {
            Ok(())
        } else {
            Err(format!("{}: expected {}, got {}", self.name, self.expected, got))
        }
    }
}

fn filled(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn sample_proposal() -> ProposalId {
    ProposalId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 9, 10])
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "dao_metadata",
            description: "Singleton key for the DAO metadata link",
            derive: || keys::encode_singleton(keys::DAO_METADATA),
            expected: "529fc5ec0943a0370fe51d4dec0787294933572592c61b103d9e170cb15e8e79",
        },
        KeyVector {
            name: "dao_majority",
            description: "Singleton key for the majority percentage",
            derive: || keys::encode_singleton(keys::DAO_MAJORITY),
            expected: "bc776f168e7b9c60bb2a7180950facd372cd90c841732d963c31a93ff9f8c127",
        },
        KeyVector {
            name: "dao_participation_rate",
            description: "Singleton key for the participation rate",
            derive: || keys::encode_singleton(keys::DAO_PARTICIPATION_RATE),
            expected: "f89f507ecd9cb7646ce1514ec6ab90d695dac9314c3771f451fd90148a3335a9",
        },
        KeyVector {
            name: "dao_minimum_voting_delay",
            description: "Singleton key for the minimum voting delay",
            derive: || keys::encode_singleton(keys::DAO_MINIMUM_VOTING_DELAY),
            expected: "799787138cc40d7a47af8e69bdea98db14e1ead8227cef96814fa51751e25c76",
        },
        KeyVector {
            name: "dao_minimum_voting_period",
            description: "Singleton key for the minimum voting period",
            derive: || keys::encode_singleton(keys::DAO_MINIMUM_VOTING_PERIOD),
            expected: "d3cf4cd71858ea36c3f5ce43955db04cbe9e1f42a2c7795c25c1d430c9bb280a",
        },
        KeyVector {
            name: "multisig_quorum",
            description: "Singleton key for the multisig quorum",
            derive: || keys::encode_singleton(keys::MULTISIG_QUORUM),
            expected: "47499aa724781173ffff2a8a82c6223b88e1a838d32bb91a9ff9c9c0b8c8759b",
        },
        KeyVector {
            name: "receiver_delegate",
            description: "Singleton key for the universal receiver delegate",
            derive: || keys::encode_singleton(keys::UNIVERSAL_RECEIVER_DELEGATE),
            expected: "0cfc51aec37c55a4d0b1a65c6255c4bf2fbdf6277f3cc0730c45b828b6db8b47",
        },
        KeyVector {
            name: "lsp3_marker",
            description: "SupportedStandards:LSP3UniversalProfile word mapping",
            derive: keys::lsp3_supported_standard_key,
            expected: "eafec4d89fa9619884b60000abe425d64acd861a49b8ddf5c0b6962110481f38",
        },
        KeyVector {
            name: "controllers_length",
            description: "Length key of AddressPermissions[]",
            derive: || keys::address_permissions_array().length_key(),
            expected: "df30dba06db6a30e65354d9a64c609861f089545ca58c6b4dbe31a5f338cb0e3",
        },
        KeyVector {
            name: "controllers_element_0",
            description: "First element of AddressPermissions[]",
            derive: || keys::address_permissions_array().element(0),
            expected: "df30dba06db6a30e65354d9a64c6098600000000000000000000000000000000",
        },
        KeyVector {
            name: "dao_participants_element_2",
            description: "Third element of DaoParticipants[]",
            derive: || ArrayKey::named(keys::DAO_PARTICIPANTS).element(2),
            expected: "f7f9c7410dd493d79ebdaee15bbc77fd00000000000000000000000000000002",
        },
        KeyVector {
            name: "dao_participants_index",
            description: "Reverse index entry of DaoParticipants[]",
            derive: || PermissionTable::Dao.registry().index_key(&filled(0x22)),
            expected: "f7f9c7410dd493d79ebd00002222222222222222222222222222222222222222",
        },
        KeyVector {
            name: "multisig_participants_length",
            description: "Length key of MultisigParticipants[]",
            derive: || ArrayKey::named(keys::MULTISIG_PARTICIPANTS).length_key(),
            expected: "54aef89da199194b126d28036f71291726191dbff7160f9d0986952b17eaedb4",
        },
        KeyVector {
            name: "controller_permissions",
            description: "AddressPermissions:Permissions:<address>",
            derive: || PermissionTable::Controller.permission_key(&filled(0x11)),
            expected: "4b80742de2bf82acb36300001111111111111111111111111111111111111111",
        },
        KeyVector {
            name: "dao_permissions",
            description: "AddressPermissions:DaoPermissions:<address>",
            derive: || PermissionTable::Dao.permission_key(&filled(0x22)),
            expected: "4b80742de2bfb3cc0e4900002222222222222222222222222222222222222222",
        },
        KeyVector {
            name: "multisig_permissions",
            description: "Literal multisig prefix followed by the address",
            derive: || PermissionTable::Multisig.permission_key(&filled(0x33)),
            expected: "4164647265734d756c7400003333333333333333333333333333333333333333",
        },
        KeyVector {
            name: "dao_delegatee",
            description: "DaoDelegatee:<delegator> mapping",
            derive: || delegatee_key(&filled(0x44)),
            expected: "cf94d16c3eacfbf014df00004444444444444444444444444444444444444444",
        },
        KeyVector {
            name: "proposal_targets",
            description: "<proposal id>:MultisigProposalTargets[] word mapping",
            derive: || proposal_keys(&sample_proposal()).0,
            expected: "0102030405060708090a0000c6c66d5a29ded4b70a2bc4d1637290a99598996b",
        },
        KeyVector {
            name: "proposal_payloads",
            description: "<proposal id>:MultisigProposalDatas[] word mapping",
            derive: || proposal_keys(&sample_proposal()).1,
            expected: "0102030405060708090a0000a127ec6f6a314082d85a8df20cec2eb66abc0e15",
        },
    ]
}

/// Verify all golden vectors, collecting every mismatch.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let errors: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| v.verify().err())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors() {
        if let Err(errors) = verify_all_vectors() {
            panic!("golden vector mismatches:\n{}", errors.join("\n"));
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        for (i, v) in vectors.iter().enumerate() {
            assert!(
                vectors[i + 1..].iter().all(|w| w.name != v.name),
                "duplicate vector {}",
                v.name
            );
        }
    }

    #[test]
    fn test_lsp3_marker_value() {
        assert_eq!(hex::encode(keys::lsp3_supported_standard_value()), "abe425d6");
    }
}
