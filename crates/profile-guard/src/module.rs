//! Plumbing shared by modules that act on a profile through its key manager.
//!
//! A module is a controller in its own right: it holds a controller mask on
//! the profile and submits writes under its own address. The external
//! caller is passed in as `acting_as` and checked against the module's own
//! permission table. Checks and planning run inside the key manager's
//! call, so the state they read cannot change before the writes land.

use std::sync::Arc;

use profile_guard_core::{Address, BitMask, Operation, WriteBatch};
use profile_guard_perms::{authorize, PermissionTable};
use profile_guard_store::DataStore;

use crate::error::Result;
use crate::key_manager::KeyManager;
use crate::profile::UniversalProfile;

pub(crate) struct Module<S: DataStore> {
    address: Address,
    key_manager: Arc<KeyManager<S>>,
}

impl<S: DataStore> Module<S> {
    pub(crate) fn new(address: Address, key_manager: Arc<KeyManager<S>>) -> Self {
        Self { address, key_manager }
    }

    pub(crate) fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn profile(&self) -> &UniversalProfile<S> {
        self.key_manager.profile()
    }

    /// Check `acting_as` against the module's table.
    pub(crate) fn authorize(&self, table: PermissionTable, acting_as: &Address, required: &BitMask) -> Result<()> {
        Ok(authorize(self.profile(), table, acting_as, required)?)
    }

    /// Plan a batch against the profile and submit it as one `setData`
    /// call, all while the key manager has the call in flight. Empty
    /// batches submit nothing.
    pub(crate) fn submit<T, F>(&self, plan: F) -> Result<T>
    where
        F: FnOnce(&UniversalProfile<S>) -> Result<(WriteBatch, T)>,
    {
        self.submit_operations(|profile| {
            let (batch, planned) = plan(profile)?;
            if batch.is_empty() {
                return Ok((Vec::new(), planned));
            }
            let (keys, values) = batch.into_parts();
            Ok((vec![Operation::SetDataBatch { keys, values }], planned))
        })
    }

    pub(crate) fn submit_operations<T, F>(&self, plan: F) -> Result<T>
    where
        F: FnOnce(&UniversalProfile<S>) -> Result<(Vec<Operation>, T)>,
    {
        self.key_manager.execute_planned(&self.address, plan)
    }
}
