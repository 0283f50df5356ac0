//! Array-backed member registries.
//!
//! A registry is an array (length key plus one element key per slot)
//! paired with a reverse map from address to slot index. Removal swaps the
//! last member into the vacated slot, so member order is not stable.
//!
//! Nothing here writes: `plan_add` and `plan_remove` return the batch that
//! performs the change, so callers can commit it together with related
//! permission writes.

use profile_guard_core::keys::{self, KeyPrefix};
use profile_guard_core::{value, Address, ArrayKey, DataKey, WriteBatch};
use profile_guard_store::{DataRead, DataReadExt};

use crate::error::{PermsError, Result};

/// A swap-delete member set stored in account data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registry {
    array: ArrayKey,
    index_prefix: KeyPrefix,
}

impl Registry {
    /// Registry over `array`, with the reverse map under its index prefix.
    pub fn new(array: ArrayKey) -> Self {
        Self {
            array,
            index_prefix: array.index_prefix(),
        }
    }

    /// Registry over the array named `name`.
    pub fn named(name: &str) -> Self {
        Self::new(ArrayKey::named(name))
    }

    pub fn array(&self) -> &ArrayKey {
        &self.array
    }

    /// Key of `address`'s slot index.
    pub fn index_key(&self, address: &Address) -> DataKey {
        keys::encode_address_mapping(&self.index_prefix, address)
    }

    /// Number of members.
    pub fn len<R: DataRead + ?Sized>(&self, store: &R) -> Result<u128> {
        Ok(store.get_uint(&self.array.length_key())?)
    }

    pub fn is_empty<R: DataRead + ?Sized>(&self, store: &R) -> Result<bool> {
        Ok(self.len(store)? == 0)
    }

    /// Member at slot `index`, if the slot is in range and filled.
    pub fn at<R: DataRead + ?Sized>(&self, store: &R, index: u128) -> Result<Option<Address>> {
        if index >= self.len(store)? {
            return Ok(None);
        }
        Ok(store.get_address(&self.array.element(index))?)
    }

    /// Slot of `address`, if it is a member.
    ///
    /// Both directions must agree: the reverse map points at a slot and
    /// that slot holds the address.
    pub fn position<R: DataRead + ?Sized>(&self, store: &R, address: &Address) -> Result<Option<u128>> {
        let raw = store.get(&self.index_key(address))?;
        if raw.is_empty() {
            return Ok(None);
        }
        let index = value::decode_uint(&raw)?;
        match self.at(store, index)? {
            Some(found) if found == *address => Ok(Some(index)),
            _ => Ok(None),
        }
    }

    /// Slot of `address`, or -1 when it is not a member.
    pub fn index_of<R: DataRead + ?Sized>(&self, store: &R, address: &Address) -> Result<i128> {
        Ok(self.position(store, address)?.map_or(-1, |i| i as i128))
    }

    pub fn is_member<R: DataRead + ?Sized>(&self, store: &R, address: &Address) -> Result<bool> {
        Ok(self.position(store, address)?.is_some())
    }

    /// All members in slot order.
    pub fn members<R: DataRead + ?Sized>(&self, store: &R) -> Result<Vec<Address>> {
        let len = self.len(store)?;
        let keys: Vec<DataKey> = (0..len).map(|i| self.array.element(i)).collect();
        store
            .get_many(&keys)?
            .into_iter()
            .zip(keys)
            .map(|(raw, key)| {
                value::decode_address(&raw)?.ok_or_else(|| {
                    PermsError::CorruptRegistry(format!("empty slot {} below length {}", key, len))
                })
            })
            .collect()
    }

    /// Plan appending `address`: element, reverse index and length.
    pub fn plan_add<R: DataRead + ?Sized>(&self, store: &R, address: &Address) -> Result<WriteBatch> {
        if self.is_member(store, address)? {
            return Err(PermsError::AlreadyMember(*address));
        }
        let len = self.len(store)?;

        let mut batch = WriteBatch::new();
        batch
            .put(self.array.element(len), value::encode_address(address))
            .put(self.index_key(address), value::encode_uint(len))
            .put(self.array.length_key(), value::encode_uint(len + 1));
        Ok(batch)
    }

    /// Plan removing `address` by moving the last member into its slot.
    pub fn plan_remove<R: DataRead + ?Sized>(&self, store: &R, address: &Address) -> Result<WriteBatch> {
        let index = self
            .position(store, address)?
            .ok_or(PermsError::NotMember(*address))?;
        let last = self.len(store)? - 1;

        let mut batch = WriteBatch::new();
        if index != last {
            let moved = self.at(store, last)?.ok_or_else(|| {
                PermsError::CorruptRegistry(format!("empty last slot {}", last))
            })?;
            batch
                .put(self.array.element(index), value::encode_address(&moved))
                .put(self.index_key(&moved), value::encode_uint(index));
        }
        batch
            .delete(self.array.element(last))
            .delete(self.index_key(address))
            .put(self.array.length_key(), value::encode_uint(last));
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_guard_core::keys::DAO_PARTICIPANTS;
    use profile_guard_store::{DataStore, MemoryStore};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn add(store: &MemoryStore, registry: &Registry, who: Address) {
        let batch = registry.plan_add(store, &who).unwrap();
        store.apply(&batch).unwrap();
    }

    #[test]
    fn test_add_writes_three_keys() {
        let store = MemoryStore::new();
        let registry = Registry::named(DAO_PARTICIPANTS);
        let batch = registry.plan_add(&store, &addr(1)).unwrap();
        assert_eq!(batch.len(), 3);

        store.apply(&batch).unwrap();
        assert_eq!(registry.len(&store).unwrap(), 1);
        assert_eq!(registry.index_of(&store, &addr(1)).unwrap(), 0);
        assert_eq!(
            hex::encode(&registry.index_key(&addr(1)).0[..12]),
            "f7f9c7410dd493d79ebd0000"
        );
    }

    #[test]
    fn test_add_existing_member_fails() {
        let store = MemoryStore::new();
        let registry = Registry::named(DAO_PARTICIPANTS);
        add(&store, &registry, addr(1));

        let err = registry.plan_add(&store, &addr(1)).unwrap_err();
        assert!(matches!(err, PermsError::AlreadyMember(a) if a == addr(1)));
        assert_eq!(registry.len(&store).unwrap(), 1);
    }

    #[test]
    fn test_remove_middle_swaps_last() {
        let store = MemoryStore::new();
        let registry = Registry::named(DAO_PARTICIPANTS);
        for n in 1..=3 {
            add(&store, &registry, addr(n));
        }

        let batch = registry.plan_remove(&store, &addr(1)).unwrap();
        store.apply(&batch).unwrap();

        assert_eq!(registry.members(&store).unwrap(), vec![addr(3), addr(2)]);
        assert_eq!(registry.index_of(&store, &addr(3)).unwrap(), 0);
        assert_eq!(registry.index_of(&store, &addr(1)).unwrap(), -1);
        assert!(store.get(&registry.array().element(2)).unwrap().is_empty());
        assert!(store.get(&registry.index_key(&addr(1))).unwrap().is_empty());
    }

    #[test]
    fn test_remove_last_member() {
        let store = MemoryStore::new();
        let registry = Registry::named(DAO_PARTICIPANTS);
        add(&store, &registry, addr(1));

        store.apply(&registry.plan_remove(&store, &addr(1)).unwrap()).unwrap();
        assert!(registry.is_empty(&store).unwrap());
        assert!(!registry.is_member(&store, &addr(1)).unwrap());
    }

    #[test]
    fn test_remove_non_member_fails() {
        let store = MemoryStore::new();
        let registry = Registry::named(DAO_PARTICIPANTS);
        let err = registry.plan_remove(&store, &addr(7)).unwrap_err();
        assert!(matches!(err, PermsError::NotMember(_)));
    }

    #[test]
    fn test_stale_index_is_not_membership() {
        let store = MemoryStore::new();
        let registry = Registry::named(DAO_PARTICIPANTS);
        add(&store, &registry, addr(1));
        // reverse map points at a slot held by someone else
        store
            .set(registry.index_key(&addr(2)), value::encode_uint(0))
            .unwrap();
        assert!(!registry.is_member(&store, &addr(2)).unwrap());
    }

    proptest! {
        #[test]
        fn prop_registry_matches_set(ops in prop::collection::vec((any::<bool>(), 1u8..8), 0..40)) {
            let store = MemoryStore::new();
            let registry = Registry::named(DAO_PARTICIPANTS);
            let mut model = BTreeSet::new();

            for (insert, n) in ops {
                let who = addr(n);
                if insert {
                    let result = registry.plan_add(&store, &who);
                    prop_assert_eq!(result.is_ok(), model.insert(who));
                    if let Ok(batch) = result {
                        store.apply(&batch).unwrap();
                    }
                } else {
                    let result = registry.plan_remove(&store, &who);
                    prop_assert_eq!(result.is_ok(), model.remove(&who));
                    if let Ok(batch) = result {
                        store.apply(&batch).unwrap();
                    }
                }

                let members = registry.members(&store).unwrap();
                prop_assert_eq!(members.len() as u128, registry.len(&store).unwrap());
                prop_assert_eq!(members.iter().copied().collect::<BTreeSet<_>>(), model.clone());
                for (i, m) in members.iter().enumerate() {
                    prop_assert_eq!(registry.index_of(&store, m).unwrap(), i as i128);
                }
            }
        }
    }
}
