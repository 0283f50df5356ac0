//! Store traits: the abstract interface to the account's key-value data.
//!
//! The account store is a flat map from 32-byte keys to byte values. It has
//! no schema; callers agree on layouts through the key codec. Reads never
//! fail for absent keys (the empty value comes back), and every write goes
//! through [`DataStore::apply`], which is all-or-nothing.

use std::sync::Arc;

use bytes::Bytes;
use profile_guard_core::{value, Address, BitMask, DataKey, WriteBatch};

use crate::error::{Result, StoreError};

/// Read access to account data.
pub trait DataRead {
    /// Get the value at `key`; empty when unset.
    fn get(&self, key: &DataKey) -> Result<Bytes>;

    /// Get several values, one per key, in order.
    fn get_many(&self, keys: &[DataKey]) -> Result<Vec<Bytes>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}

/// Read/write access to account data.
///
/// Implementations must apply each batch atomically: after an error no
/// entry of the batch is visible.
pub trait DataStore: DataRead + Send + Sync {
    /// Apply every write of `batch`, or none of them.
    fn apply(&self, batch: &WriteBatch) -> Result<()>;

    /// Set one value. An empty value deletes the entry.
    fn set(&self, key: DataKey, value: Bytes) -> Result<()> {
        self.apply(&WriteBatch::single(key, value))
    }

    /// Set several values atomically.
    fn set_many(&self, keys: &[DataKey], values: &[Bytes]) -> Result<()> {
        let batch = WriteBatch::from_parallel(keys, values).ok_or(StoreError::LengthMismatch {
            keys: keys.len(),
            values: values.len(),
        })?;
        self.apply(&batch)
    }
}

impl<T: DataRead + ?Sized> DataRead for &T {
    fn get(&self, key: &DataKey) -> Result<Bytes> {
        (**self).get(key)
    }
}

impl<T: DataRead + ?Sized> DataRead for Arc<T> {
    fn get(&self, key: &DataKey) -> Result<Bytes> {
        (**self).get(key)
    }
}

impl<T: DataStore + ?Sized> DataStore for Arc<T> {
    fn apply(&self, batch: &WriteBatch) -> Result<()> {
        (**self).apply(batch)
    }
}

/// Typed reads on top of [`DataRead`].
pub trait DataReadExt: DataRead {
    /// Read a big-endian unsigned integer; unset reads as zero.
    fn get_uint(&self, key: &DataKey) -> Result<u128> {
        let raw = self.get(key)?;
        value::decode_uint(&raw).map_err(|source| StoreError::InvalidValue { key: *key, source })
    }

    /// Read a permission mask; unset reads as the zero mask.
    fn get_mask(&self, key: &DataKey) -> Result<BitMask> {
        let raw = self.get(key)?;
        BitMask::from_value(&raw).map_err(|source| StoreError::InvalidValue { key: *key, source })
    }

    /// Read an address; unset reads as `None`.
    fn get_address(&self, key: &DataKey) -> Result<Option<Address>> {
        let raw = self.get(key)?;
        value::decode_address(&raw).map_err(|source| StoreError::InvalidValue { key: *key, source })
    }
}

impl<T: DataRead + ?Sized> DataReadExt for T {}

/// A view that sees staged writes before the underlying data.
///
/// Planners use it to build several dependent changes into one batch.
pub struct Staged<'a, R: DataRead + ?Sized> {
    base: &'a R,
    staged: &'a WriteBatch,
}

impl<'a, R: DataRead + ?Sized> Staged<'a, R> {
    pub fn new(base: &'a R, staged: &'a WriteBatch) -> Self {
        Self { base, staged }
    }
}

impl<R: DataRead + ?Sized> DataRead for Staged<'_, R> {
    fn get(&self, key: &DataKey) -> Result<Bytes> {
        match self.staged.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }
}
