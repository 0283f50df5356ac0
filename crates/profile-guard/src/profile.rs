//! The universal profile: an account whose state is a key-value store,
//! guarded by two-step ownership.
//!
//! The owner is either an external account or, once handed over, a
//! [`KeyManager`](crate::KeyManager). Every mutation is owner-only and is
//! committed as one atomic batch.

use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use profile_guard_core::keys::{self, UNIVERSAL_RECEIVER_DELEGATE};
use profile_guard_core::{value, Address, DataKey, Operation, WriteBatch};
use profile_guard_store::{DataRead, DataStore};

use crate::error::{ProfileError, Result};

/// Observer of committed data changes.
///
/// Called after a batch is durable, with the keys it wrote in write order.
pub trait DataChangedListener: Send + Sync {
    fn data_changed(&self, keys: &[DataKey]);
}

/// Current and pending owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub owner: Address,
    pub pending: Option<Address>,
}

impl Ownership {
    fn require_owner(&self, caller: &Address) -> Result<()> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(ProfileError::Unauthorized { caller: *caller })
        }
    }

    fn transfer(&mut self, caller: &Address, candidate: Address) -> Result<()> {
        self.require_owner(caller)?;
        self.pending = Some(candidate);
        Ok(())
    }

    fn claim(&mut self, caller: &Address) -> Result<()> {
        if self.pending != Some(*caller) {
            return Err(ProfileError::Unauthorized { caller: *caller });
        }
        self.owner = *caller;
        self.pending = None;
        Ok(())
    }
}

/// A key-value account with an owner.
pub struct UniversalProfile<S: DataStore> {
    address: Address,
    store: S,
    ownership: RwLock<Ownership>,
    listeners: RwLock<Vec<Arc<dyn DataChangedListener>>>,
}

impl<S: DataStore> UniversalProfile<S> {
    /// Wrap existing account data.
    pub fn new(address: Address, owner: Address, store: S) -> Self {
        Self {
            address,
            store,
            ownership: RwLock::new(Ownership { owner, pending: None }),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Create a fresh profile: registers the LSP3 standard marker and, when
    /// given, the universal receiver delegate.
    pub fn deploy(
        address: Address,
        owner: Address,
        store: S,
        receiver_delegate: Option<Address>,
    ) -> Result<Self> {
        let profile = Self::new(address, owner, store);

        let mut batch = WriteBatch::new();
        if let Some(delegate) = receiver_delegate {
            batch.put(
                keys::encode_singleton(UNIVERSAL_RECEIVER_DELEGATE),
                value::encode_address(&delegate),
            );
        }
        batch.put(
            keys::lsp3_supported_standard_key(),
            Bytes::copy_from_slice(&keys::lsp3_supported_standard_value()),
        );
        profile.store.apply(&batch)?;

        tracing::info!(profile = %address, %owner, "profile deployed");
        Ok(profile)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownership().owner
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.ownership().pending
    }

    fn ownership(&self) -> Ownership {
        *self.ownership.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer of committed writes.
    pub fn add_listener(&self, listener: Arc<dyn DataChangedListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn get_data(&self, key: &DataKey) -> Result<Bytes> {
        Ok(self.store.get(key)?)
    }

    pub fn get_data_batch(&self, keys: &[DataKey]) -> Result<Vec<Bytes>> {
        Ok(self.store.get_many(keys)?)
    }

    pub fn set_data(&self, caller: &Address, key: DataKey, value: Bytes) -> Result<()> {
        self.apply_operations(caller, &[Operation::SetData { key, value }])
    }

    pub fn set_data_batch(&self, caller: &Address, keys: Vec<DataKey>, values: Vec<Bytes>) -> Result<()> {
        self.apply_operations(caller, &[Operation::SetDataBatch { keys, values }])
    }

    /// Owner-only commit of a prepared batch.
    pub fn apply_batch(&self, caller: &Address, batch: &WriteBatch) -> Result<()> {
        let guard = self.ownership.write().unwrap_or_else(PoisonError::into_inner);
        guard.require_owner(caller)?;
        self.store.apply(batch)?;
        drop(guard);

        tracing::debug!(%caller, writes = batch.len(), "batch committed");
        self.notify(batch);
        Ok(())
    }

    /// Nominate `candidate` as the next owner. The current owner keeps
    /// control until the candidate claims.
    pub fn transfer_ownership(&self, caller: &Address, candidate: Address) -> Result<()> {
        self.apply_operations(caller, &[Operation::TransferOwnership { candidate }])
    }

    /// Complete a transfer; only the pending owner may claim.
    pub fn claim_ownership(&self, caller: &Address) -> Result<()> {
        self.apply_operations(caller, &[Operation::ClaimOwnership])
    }

    /// Run `ops` in order as one unit.
    ///
    /// Each operation is checked against the ownership state left by the
    /// ones before it. Data writes and the final ownership state are only
    /// committed if every operation passes.
    pub fn apply_operations(&self, caller: &Address, ops: &[Operation]) -> Result<()> {
        let mut guard = self.ownership.write().unwrap_or_else(PoisonError::into_inner);
        let mut staged = *guard;
        let mut batch = WriteBatch::new();

        for op in ops {
            match op {
                Operation::SetData { key, value } => {
                    staged.require_owner(caller)?;
                    batch.put(*key, value.clone());
                }
                Operation::SetDataBatch { keys, values } => {
                    staged.require_owner(caller)?;
                    let writes = WriteBatch::from_parallel(keys, values).ok_or(ProfileError::LengthMismatch {
                        keys: keys.len(),
                        values: values.len(),
                    })?;
                    batch.extend(writes);
                }
                Operation::TransferOwnership { candidate } => {
                    staged.transfer(caller, *candidate)?;
                }
                Operation::ClaimOwnership => {
                    staged.claim(caller)?;
                }
            }
        }

        if !batch.is_empty() {
            self.store.apply(&batch)?;
        }
        let before = *guard;
        *guard = staged;
        drop(guard);

        if before.pending != staged.pending {
            if let Some(candidate) = staged.pending {
                tracing::info!(profile = %self.address, owner = %staged.owner, %candidate, "ownership transfer started");
            }
        }
        if before.owner != staged.owner {
            tracing::info!(profile = %self.address, from = %before.owner, to = %staged.owner, "ownership claimed");
        }
        if !batch.is_empty() {
            tracing::debug!(%caller, writes = batch.len(), "batch committed");
            self.notify(&batch);
        }
        Ok(())
    }

    fn notify(&self, batch: &WriteBatch) {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if listeners.is_empty() {
            return;
        }
        let keys: Vec<DataKey> = batch.keys().copied().collect();
        for listener in listeners {
            listener.data_changed(&keys);
        }
    }
}

impl<S: DataStore> DataRead for UniversalProfile<S> {
    fn get(&self, key: &DataKey) -> profile_guard_store::Result<Bytes> {
        self.store.get(key)
    }

    fn get_many(&self, keys: &[DataKey]) -> profile_guard_store::Result<Vec<Bytes>> {
        self.store.get_many(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_guard_store::MemoryStore;
    use std::sync::Mutex;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn profile() -> UniversalProfile<MemoryStore> {
        UniversalProfile::deploy(addr(0xaa), addr(1), MemoryStore::new(), Some(addr(0xdd))).unwrap()
    }

    #[test]
    fn test_deploy_registers_standard_and_delegate() {
        let up = profile();
        let values = up
            .get_data_batch(&[
                keys::encode_singleton(UNIVERSAL_RECEIVER_DELEGATE),
                keys::lsp3_supported_standard_key(),
            ])
            .unwrap();
        assert_eq!(values[0].as_ref(), &[0xdd; 20]);
        assert_eq!(values[1].as_ref(), &[0xab, 0xe4, 0x25, 0xd6]);
    }

    #[test]
    fn test_only_owner_sets_data() {
        let up = profile();
        let key = DataKey::from_bytes([7; 32]);

        let err = up.set_data(&addr(2), key, Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, ProfileError::Unauthorized { caller } if caller == addr(2)));
        assert!(up.get_data(&key).unwrap().is_empty());

        up.set_data(&addr(1), key, Bytes::from_static(b"x")).unwrap();
        assert_eq!(up.get_data(&key).unwrap().as_ref(), b"x");
    }

    #[test]
    fn test_batch_length_mismatch() {
        let up = profile();
        let err = up
            .set_data_batch(&addr(1), vec![DataKey::from_bytes([1; 32])], vec![])
            .unwrap_err();
        assert!(matches!(err, ProfileError::LengthMismatch { keys: 1, values: 0 }));
    }

    #[test]
    fn test_two_step_ownership() {
        let up = profile();
        up.transfer_ownership(&addr(1), addr(2)).unwrap();
        assert_eq!(up.owner(), addr(1));
        assert_eq!(up.pending_owner(), Some(addr(2)));

        // candidate has no power before claiming
        let key = DataKey::from_bytes([3; 32]);
        assert!(up.set_data(&addr(2), key, Bytes::from_static(b"a")).is_err());
        // and only the candidate may claim
        assert!(up.claim_ownership(&addr(3)).is_err());

        up.claim_ownership(&addr(2)).unwrap();
        assert_eq!(up.owner(), addr(2));
        assert_eq!(up.pending_owner(), None);
        assert!(up.set_data(&addr(1), key, Bytes::from_static(b"a")).is_err());
        up.set_data(&addr(2), key, Bytes::from_static(b"a")).unwrap();
    }

    #[test]
    fn test_failed_operation_rolls_back_everything() {
        let up = profile();
        let key = DataKey::from_bytes([4; 32]);
        let ops = [
            Operation::SetData {
                key,
                value: Bytes::from_static(b"v"),
            },
            Operation::TransferOwnership { candidate: addr(2) },
            Operation::ClaimOwnership,
        ];

        // addr(1) is not the pending owner, so the claim fails
        assert!(up.apply_operations(&addr(1), &ops).is_err());
        assert!(up.get_data(&key).unwrap().is_empty());
        assert_eq!(up.pending_owner(), None);
    }

    struct Recorder(Mutex<Vec<DataKey>>);

    impl DataChangedListener for Recorder {
        fn data_changed(&self, keys: &[DataKey]) {
            self.0.lock().unwrap().extend_from_slice(keys);
        }
    }

    #[test]
    fn test_listener_sees_committed_keys() {
        let up = profile();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        up.add_listener(recorder.clone());

        let a = DataKey::from_bytes([1; 32]);
        let b = DataKey::from_bytes([2; 32]);
        up.set_data_batch(&addr(1), vec![a, b], vec![Bytes::from_static(b"1"), Bytes::from_static(b"2")])
            .unwrap();
        let _ = up.set_data(&addr(9), a, Bytes::from_static(b"no"));

        assert_eq!(*recorder.0.lock().unwrap(), vec![a, b]);
    }
}
