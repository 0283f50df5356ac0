//! In-memory implementation of the store traits.
//!
//! This is primarily for testing and for embedders that keep account data
//! elsewhere. It has the same semantics as SQLite but keeps everything in
//! memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use profile_guard_core::{DataKey, WriteBatch};

use crate::error::{Result, StoreError};
use crate::traits::{DataRead, DataStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// a batch is applied under one write lock, so readers never observe a
/// partial batch.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<DataKey, Bytes>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl DataRead for MemoryStore {
    fn get(&self, key: &DataKey) -> Result<Bytes> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    fn get_many(&self, keys: &[DataKey]) -> Result<Vec<Bytes>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(keys
            .iter()
            .map(|key| entries.get(key).cloned().unwrap_or_default())
            .collect())
    }
}

impl DataStore for MemoryStore {
    fn apply(&self, batch: &WriteBatch) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        for (key, value) in batch.iter() {
            if value.is_empty() {
                entries.remove(key);
            } else {
                entries.insert(*key, value.clone());
            }
        }
        tracing::trace!(writes = batch.len(), "applied batch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DataReadExt, Staged};
    use profile_guard_core::{value, BitMask};

    fn key(n: u8) -> DataKey {
        DataKey::from_bytes([n; 32])
    }

    #[test]
    fn test_unset_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.get(&key(1)).unwrap().is_empty());
        assert_eq!(store.get_uint(&key(1)).unwrap(), 0);
        assert!(store.get_mask(&key(1)).unwrap().is_zero());
        assert_eq!(store.get_address(&key(1)).unwrap(), None);
    }

    #[test]
    fn test_set_and_overwrite() {
        let store = MemoryStore::new();
        store.set(key(1), Bytes::from_static(b"a")).unwrap();
        store.set(key(1), Bytes::from_static(b"b")).unwrap();
        assert_eq!(store.get(&key(1)).unwrap().as_ref(), b"b");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_empty_value_removes_entry() {
        let store = MemoryStore::new();
        store.set(key(1), Bytes::from_static(b"a")).unwrap();
        store.set(key(1), Bytes::new()).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_set_many_length_mismatch_writes_nothing() {
        let store = MemoryStore::new();
        let err = store
            .set_many(&[key(1), key(2)], &[Bytes::from_static(b"x")])
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthMismatch { keys: 2, values: 1 }));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_get_many_preserves_order() {
        let store = MemoryStore::new();
        store
            .set_many(
                &[key(1), key(2)],
                &[Bytes::from_static(b"one"), Bytes::from_static(b"two")],
            )
            .unwrap();
        let values = store.get_many(&[key(2), key(3), key(1)]).unwrap();
        assert_eq!(values[0].as_ref(), b"two");
        assert!(values[1].is_empty());
        assert_eq!(values[2].as_ref(), b"one");
    }

    #[test]
    fn test_staged_reads_pending_writes_first() {
        let store = MemoryStore::new();
        store.set(key(1), value::encode_uint(3)).unwrap();
        store.set(key(2), BitMask::from_u128(0x0f).to_value()).unwrap();

        let mut pending = WriteBatch::new();
        pending.put(key(1), value::encode_uint(4)).delete(key(2));

        let staged = Staged::new(&store, &pending);
        assert_eq!(staged.get_uint(&key(1)).unwrap(), 4);
        assert!(staged.get_mask(&key(2)).unwrap().is_zero());
        assert_eq!(store.get_uint(&key(1)).unwrap(), 3);
    }

    #[test]
    fn test_bad_mask_reports_key() {
        let store = MemoryStore::new();
        store.set(key(5), Bytes::from_static(&[1, 2, 3])).unwrap();
        let err = store.get_mask(&key(5)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { key: k, .. } if k == key(5)));
    }
}
