//! Vote delegation between DAO members.
//!
//! Each delegator points at one delegatee (`DaoDelegatee:<delegator>`), and
//! each delegatee keeps a registry of its delegators under a per-delegatee
//! array, `DaoDelegates[]` hashed together with the delegatee address.

use std::sync::Arc;

use profile_guard_core::keys::{self, DAO_DELEGATEE, DAO_DELEGATES};
use profile_guard_core::{keccak256, value, Address, ArrayKey, DataKey, WriteBatch};
use profile_guard_perms::permissions::dao;
use profile_guard_perms::{PermissionTable, Registry};
use profile_guard_store::{DataReadExt, DataStore};

use crate::error::{ProfileError, Result};
use crate::key_manager::KeyManager;
use crate::module::Module;

const TABLE: PermissionTable = PermissionTable::Dao;

/// Key holding the address `delegator` delegates to.
pub fn delegatee_key(delegator: &Address) -> DataKey {
    keys::encode_address_mapping(&keys::mapping_prefix(DAO_DELEGATEE), delegator)
}

/// Registry of the members delegating to `delegatee`.
pub fn delegates_registry(delegatee: &Address) -> Registry {
    let mut preimage = DAO_DELEGATES.as_bytes().to_vec();
    preimage.extend_from_slice(delegatee.as_bytes());
    Registry::new(ArrayKey::from_length_key(DataKey::from_bytes(keccak256(&preimage))))
}

/// The DAO delegation module.
pub struct DaoDelegates<S: DataStore> {
    module: Module<S>,
}

impl<S: DataStore> DaoDelegates<S> {
    pub fn new(address: Address, key_manager: Arc<KeyManager<S>>) -> Self {
        Self {
            module: Module::new(address, key_manager),
        }
    }

    pub fn address(&self) -> Address {
        self.module.address()
    }

    /// Delegate the caller's vote to `delegatee`.
    pub fn delegate(&self, acting_as: &Address, delegatee: &Address) -> Result<()> {
        self.module.submit(|profile| {
            self.module.authorize(TABLE, acting_as, &dao::SEND_DELEGATE)?;
            self.module.authorize(TABLE, delegatee, &dao::RECEIVE_DELEGATE)?;
            if acting_as == delegatee {
                return Err(ProfileError::InvalidDelegation("cannot delegate to self".into()));
            }
            if let Some(current) = profile.get_address(&delegatee_key(acting_as))? {
                return Err(ProfileError::InvalidDelegation(format!(
                    "{} already delegates to {}",
                    acting_as, current
                )));
            }

            let mut batch = WriteBatch::new();
            batch.put(delegatee_key(acting_as), value::encode_address(delegatee));
            batch.extend(delegates_registry(delegatee).plan_add(profile, acting_as)?);
            Ok((batch, ()))
        })?;

        tracing::info!(delegator = %acting_as, %delegatee, "vote delegated");
        Ok(())
    }

    /// Withdraw the caller's delegation.
    pub fn undelegate(&self, acting_as: &Address) -> Result<()> {
        let delegatee = self.module.submit(|profile| {
            let delegatee = profile
                .get_address(&delegatee_key(acting_as))?
                .ok_or_else(|| ProfileError::InvalidDelegation(format!("{} is not delegating", acting_as)))?;

            let mut batch = WriteBatch::new();
            batch.delete(delegatee_key(acting_as));
            batch.extend(delegates_registry(&delegatee).plan_remove(profile, acting_as)?);
            Ok((batch, delegatee))
        })?;

        tracing::info!(delegator = %acting_as, %delegatee, "delegation withdrawn");
        Ok(())
    }

    pub fn delegatee_of(&self, delegator: &Address) -> Result<Option<Address>> {
        Ok(self.module.profile().get_address(&delegatee_key(delegator))?)
    }

    pub fn delegators_of(&self, delegatee: &Address) -> Result<Vec<Address>> {
        Ok(delegates_registry(delegatee).members(self.module.profile())?)
    }
}
