//! DAO membership: granting, revoking and claiming DAO permissions.

use std::sync::Arc;

use profile_guard_core::{Address, BitMask, Ed25519Recovery, SignerRecovery};
use profile_guard_perms::permissions::dao;
use profile_guard_perms::{
    new_permission_hash, permissions_of, plan_add_permissions, plan_remove_permissions, verify_claim, ClaimScope,
    PermissionTable,
};
use profile_guard_store::DataStore;

use crate::error::Result;
use crate::key_manager::KeyManager;
use crate::module::Module;

const TABLE: PermissionTable = PermissionTable::Dao;

/// The DAO permissions module.
pub struct DaoPermissions<S: DataStore> {
    module: Module<S>,
    recovery: Arc<dyn SignerRecovery>,
}

impl<S: DataStore> DaoPermissions<S> {
    /// Module controller at `address`, submitting through `key_manager`.
    pub fn new(address: Address, key_manager: Arc<KeyManager<S>>) -> Self {
        Self::with_recovery(address, key_manager, Arc::new(Ed25519Recovery))
    }

    pub fn with_recovery(
        address: Address,
        key_manager: Arc<KeyManager<S>>,
        recovery: Arc<dyn SignerRecovery>,
    ) -> Self {
        Self {
            module: Module::new(address, key_manager),
            recovery,
        }
    }

    pub fn address(&self) -> Address {
        self.module.address()
    }

    /// Merge `mask` into `target`'s DAO permissions.
    pub fn add_permissions(&self, acting_as: &Address, target: &Address, mask: &BitMask) -> Result<()> {
        self.module.submit(|profile| {
            self.module.authorize(TABLE, acting_as, &dao::ADD_PERMISSION)?;
            Ok((plan_add_permissions(profile, TABLE, target, mask)?, ()))
        })?;
        tracing::info!(%acting_as, %target, permission = %TABLE.describe(mask), "dao permissions added");
        Ok(())
    }

    /// Clear `mask` from `target`'s DAO permissions; a member left with
    /// nothing leaves the participant list.
    pub fn remove_permissions(&self, acting_as: &Address, target: &Address, mask: &BitMask) -> Result<()> {
        self.module.submit(|profile| {
            self.module.authorize(TABLE, acting_as, &dao::REMOVE_PERMISSION)?;
            Ok((plan_remove_permissions(profile, TABLE, target, mask)?, ()))
        })?;
        tracing::info!(%acting_as, %target, permission = %TABLE.describe(mask), "dao permissions removed");
        Ok(())
    }

    /// Digest `authority` signs to let `grantee` claim `permission`.
    pub fn get_new_permission_hash(
        &self,
        authority: &Address,
        grantee: &Address,
        permission: &BitMask,
    ) -> Result<[u8; 32]> {
        Ok(new_permission_hash(self.module.profile(), &self.claim_scope(), authority, grantee, permission)?)
    }

    /// Redeem a signed grant from `authority` for the caller.
    pub fn claim_permission(
        &self,
        acting_as: &Address,
        authority: &Address,
        permission: &BitMask,
        signature: &[u8],
    ) -> Result<()> {
        let scope = self.claim_scope();
        self.module.submit(|profile| {
            let batch = verify_claim(profile, &*self.recovery, &scope, authority, acting_as, permission, signature)?;
            Ok((batch, ()))
        })
    }

    /// Claims are only good on this profile, through this module.
    fn claim_scope(&self) -> ClaimScope {
        ClaimScope {
            profile: self.module.profile().address(),
            module: self.module.address(),
        }
    }

    pub fn permissions_of(&self, address: &Address) -> Result<BitMask> {
        Ok(permissions_of(self.module.profile(), TABLE, address)?)
    }

    /// Current DAO participants, in registry order.
    pub fn participants(&self) -> Result<Vec<Address>> {
        Ok(TABLE.registry().members(self.module.profile())?)
    }
}
