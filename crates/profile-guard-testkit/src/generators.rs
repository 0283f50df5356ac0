//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use profile_guard::{DaoSettings, MemberConfig, MultisigSettings};
use profile_guard_core::{Address, BitMask, DataKey, Operation, Signer};

/// Generate a random signer.
pub fn signer() -> impl Strategy<Value = Signer> {
    any::<[u8; 32]>().prop_map(|seed| Signer::from_seed(&seed))
}

/// Generate a random Address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// Generate a random DataKey.
pub fn data_key() -> impl Strategy<Value = DataKey> {
    any::<[u8; 32]>().prop_map(DataKey::from_bytes)
}

/// Generate a mask over the low 16 bits, where every defined permission lives.
pub fn mask() -> impl Strategy<Value = BitMask> {
    any::<u16>().prop_map(|bits| BitMask::from_u128(bits as u128))
}

/// Generate a mask anywhere in the 256-bit word.
pub fn wide_mask() -> impl Strategy<Value = BitMask> {
    any::<[u8; 32]>().prop_map(BitMask::from_bytes)
}

/// Generate a data value of at most `max_len` bytes (empty means delete).
pub fn value(max_len: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=max_len).prop_map(Bytes::from)
}

/// Generate a profile operation.
pub fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (data_key(), value(64)).prop_map(|(key, value)| Operation::SetData { key, value }),
        prop::collection::vec((data_key(), value(64)), 0..4).prop_map(|pairs| {
            let (keys, values) = pairs.into_iter().unzip();
            Operation::SetDataBatch { keys, values }
        }),
        address().prop_map(|candidate| Operation::TransferOwnership { candidate }),
        Just(Operation::ClaimOwnership),
    ]
}

/// Generate up to `max` members with distinct addresses.
pub fn members(max: usize) -> impl Strategy<Value = Vec<MemberConfig>> {
    prop::collection::btree_map(address(), mask(), 0..=max).prop_map(|members| {
        members
            .into_iter()
            .map(|(address, permissions)| MemberConfig::new(address, permissions))
            .collect()
    })
}

/// Generate valid DAO settings.
pub fn dao_settings() -> impl Strategy<Value = DaoSettings> {
    (
        "[a-z]{1,12}",
        0u8..=100,
        0u8..=100,
        0u128..=86_400,
        0u128..=86_400,
        members(6),
    )
        .prop_map(
            |(name, majority, participation_rate, delay, period, members)| DaoSettings {
                metadata: format!("https://{name}.example/"),
                majority,
                participation_rate,
                minimum_voting_delay: delay,
                minimum_voting_period: period,
                members,
            },
        )
}

/// Generate valid multisig settings.
pub fn multisig_settings() -> impl Strategy<Value = MultisigSettings> {
    (0u8..=100, members(6)).prop_map(|(quorum, members)| MultisigSettings { quorum, members })
}

/// One step against a membership registry.
#[derive(Debug, Clone)]
pub enum RegistryOp {
    Add(Address),
    Remove(Address),
}

/// Generate registry steps over a small address pool, so adds and removes collide.
pub fn registry_ops(max_len: usize) -> impl Strategy<Value = Vec<RegistryOp>> {
    let pooled = (0u8..6).prop_map(|n| Address::from_bytes([n; 20]));
    let op = prop_oneof![
        pooled.clone().prop_map(RegistryOp::Add),
        pooled.prop_map(RegistryOp::Remove),
    ];
    prop::collection::vec(op, 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_dao_settings_validate(settings in dao_settings()) {
            prop_assert!(settings.validate().is_ok());
        }

        #[test]
        fn generated_multisig_settings_validate(settings in multisig_settings()) {
            prop_assert!(settings.validate().is_ok());
        }

        #[test]
        fn strangers_cannot_operate_a_profile(op in operation(), stranger in address()) {
            use profile_guard::{ProfileError, UniversalProfile};
            use profile_guard_store::MemoryStore;

            let owner = Address::from_bytes([0xaa; 20]);
            prop_assume!(stranger != owner);
            let profile = UniversalProfile::new(Address::from_bytes([0xbb; 20]), owner, MemoryStore::new());

            let result = profile.apply_operations(&stranger, std::slice::from_ref(&op));
            prop_assert!(matches!(result, Err(ProfileError::Unauthorized { .. })), "unexpected {:?}", result);
            prop_assert_eq!(profile.owner(), owner);
            prop_assert_eq!(profile.pending_owner(), None);
        }
    }
}
