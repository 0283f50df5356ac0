//! The key manager: a controller that owns a profile and forwards calls
//! from addresses holding the right controller permissions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use profile_guard_core::keys;
use profile_guard_core::{Address, BitMask, DataKey, Operation, WriteBatch};
use profile_guard_perms::permissions::controller;
use profile_guard_perms::{permissions_of, PermissionTable};
use profile_guard_store::{DataRead, DataStore, Staged};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use crate::profile::UniversalProfile;

/// Key manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyManagerConfig {
    /// Reject calls that arrive while another call is executing, whether
    /// nested or from another thread. When disabled, callers must
    /// serialize access themselves.
    pub reentrancy_guard: bool,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            reentrancy_guard: true,
        }
    }
}

/// Gatekeeper between callers and a profile it owns.
pub struct KeyManager<S: DataStore> {
    address: Address,
    profile: Arc<UniversalProfile<S>>,
    config: KeyManagerConfig,
    executing: AtomicBool,
}

/// Clears the in-flight flag when a call finishes, including on error.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: DataStore> KeyManager<S> {
    pub fn new(address: Address, profile: Arc<UniversalProfile<S>>, config: KeyManagerConfig) -> Self {
        Self {
            address,
            profile,
            config,
            executing: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn profile(&self) -> &Arc<UniversalProfile<S>> {
        &self.profile
    }

    /// Whether this key manager currently owns its profile.
    pub fn is_profile_owner(&self) -> bool {
        self.profile.owner() == self.address
    }

    /// Decode an ABI call payload and execute it on behalf of `caller`.
    pub fn execute(&self, caller: &Address, payload: &[u8]) -> Result<Bytes> {
        let op = Operation::decode(payload)?;
        self.execute_operation(caller, op)?;
        Ok(Bytes::new())
    }

    pub fn execute_operation(&self, caller: &Address, op: Operation) -> Result<()> {
        self.execute_batch(caller, &[op])
    }

    /// Authorize every operation, then apply them all on the profile as
    /// one unit. Nothing is written unless all of them pass.
    pub fn execute_batch(&self, caller: &Address, ops: &[Operation]) -> Result<()> {
        let _in_flight = self.enter(caller)?;
        self.run(caller, ops)
    }

    /// Like [`Self::execute_batch`], but the operations are planned by
    /// `plan` against the profile while the call is in flight, so no other
    /// call can change what the plan read before it is applied.
    pub fn execute_planned<T, F>(&self, caller: &Address, plan: F) -> Result<T>
    where
        F: FnOnce(&UniversalProfile<S>) -> Result<(Vec<Operation>, T)>,
    {
        let _in_flight = self.enter(caller)?;
        let (ops, planned) = plan(&self.profile)?;
        self.run(caller, &ops)?;
        Ok(planned)
    }

    fn run(&self, caller: &Address, ops: &[Operation]) -> Result<()> {
        let mask = permissions_of(&*self.profile, PermissionTable::Controller, caller)?;
        let mut pending = WriteBatch::new();
        for op in ops {
            self.authorize(caller, &mask, op, &pending)?;
            if let Operation::SetData { key, value } = op {
                pending.put(*key, value.clone());
            } else if let Operation::SetDataBatch { keys, values } = op {
                for (key, value) in keys.iter().zip(values) {
                    pending.put(*key, value.clone());
                }
            }
        }

        tracing::debug!(%caller, ops = ops.len(), "forwarding to profile");
        self.profile.apply_operations(&self.address, ops)
    }

    fn enter(&self, caller: &Address) -> Result<Option<InFlight<'_>>> {
        if !self.config.reentrancy_guard {
            return Ok(None);
        }
        if self
            .executing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::warn!(key_manager = %self.address, %caller, "re-entrant call rejected");
            return Err(ProfileError::ReentrantCall(self.address));
        }
        Ok(Some(InFlight(&self.executing)))
    }

    fn authorize(&self, caller: &Address, mask: &BitMask, op: &Operation, pending: &WriteBatch) -> Result<()> {
        match op {
            Operation::TransferOwnership { .. } | Operation::ClaimOwnership => {
                require(caller, mask, &controller::CHANGEOWNER)
            }
            Operation::SetData { key, .. } => self.authorize_key(caller, mask, key, pending),
            Operation::SetDataBatch { keys, .. } => {
                for key in keys {
                    self.authorize_key(caller, mask, key, pending)?;
                }
                Ok(())
            }
        }
    }

    fn authorize_key(&self, caller: &Address, mask: &BitMask, key: &DataKey, pending: &WriteBatch) -> Result<()> {
        if is_permission_key(key) {
            let current = Staged::new(&*self.profile, pending).get(key)?;
            let required = if current.is_empty() {
                controller::ADDPERMISSIONS
            } else {
                controller::CHANGEPERMISSIONS
            };
            require(caller, mask, &required)
        } else if mask.contains(&controller::SUPER_SETDATA) {
            Ok(())
        } else {
            require(caller, mask, &controller::SETDATA)
        }
    }
}

fn require(caller: &Address, mask: &BitMask, required: &BitMask) -> Result<()> {
    if mask.contains(required) {
        return Ok(());
    }
    let permission = PermissionTable::Controller.describe(&required.without(mask));
    tracing::warn!(%caller, %permission, "controller call rejected");
    Err(ProfileError::NotAuthorised {
        from: *caller,
        permission,
    })
}

/// Keys that grant or describe permissions: the `AddressPermissions[]`
/// array, every `AddressPermissions:*` mapping, and the claim nonces that
/// keep signed grants single-use.
pub fn is_permission_key(key: &DataKey) -> bool {
    let controllers = keys::address_permissions_array();
    *key == controllers.length_key()
        || controllers.is_element(key)
        || key.starts_with(&keys::address_permissions_group())
        || key.starts_with(&keys::mapping_prefix(keys::DAO_CLAIM_NONCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_guard_store::MemoryStore;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    const KM: u8 = 0xee;

    /// Profile owned by the key manager, with `controller` holding `mask`.
    fn setup(controller: Address, mask: u128) -> KeyManager<MemoryStore> {
        let up = Arc::new(UniversalProfile::new(addr(0xaa), addr(1), MemoryStore::new()));
        up.set_data(
            &addr(1),
            PermissionTable::Controller.permission_key(&controller),
            BitMask::from_u128(mask).to_value(),
        )
        .unwrap();
        up.transfer_ownership(&addr(1), addr(KM)).unwrap();
        let km = KeyManager::new(addr(KM), up, KeyManagerConfig::default());
        km.execute(&controller, &Operation::ClaimOwnership.encode()).unwrap();
        km
    }

    #[test]
    fn test_claim_through_key_manager() {
        let km = setup(addr(1), 0x1);
        assert!(km.is_profile_owner());
    }

    #[test]
    fn test_setdata_requires_setdata() {
        let km = setup(addr(1), 0x1);
        let op = Operation::SetData {
            key: DataKey::from_bytes([5; 32]),
            value: Bytes::from_static(b"v"),
        };
        let err = km.execute(&addr(1), &op.encode()).unwrap_err();
        assert!(matches!(err, ProfileError::NotAuthorised { ref permission, .. } if permission == "SETDATA"));
    }

    #[test]
    fn test_super_setdata_is_enough() {
        let km = setup(addr(1), 0x401);
        let key = DataKey::from_bytes([5; 32]);
        km.execute_operation(&addr(1), Operation::SetData { key, value: Bytes::from_static(b"v") })
            .unwrap();
        assert_eq!(km.profile().get_data(&key).unwrap().as_ref(), b"v");
    }

    #[test]
    fn test_permission_keys_need_add_then_change() {
        // ADDPERMISSIONS only
        let km = setup(addr(1), 0x5);
        let key = PermissionTable::Controller.permission_key(&addr(2));
        let grant = |mask: u128| Operation::SetData {
            key,
            value: BitMask::from_u128(mask).to_value(),
        };

        km.execute_operation(&addr(1), grant(0x8)).unwrap();
        let err = km.execute_operation(&addr(1), grant(0x18)).unwrap_err();
        assert!(matches!(err, ProfileError::NotAuthorised { ref permission, .. } if permission == "CHANGEPERMISSIONS"));
    }

    #[test]
    fn test_dao_permission_keys_are_permission_keys() {
        let key = PermissionTable::Dao.permission_key(&addr(2));
        assert!(is_permission_key(&key));
        assert!(is_permission_key(&keys::address_permissions_array().element(3)));
        assert!(!is_permission_key(&PermissionTable::Multisig.permission_key(&addr(2))));
    }

    #[test]
    fn test_setdata_cannot_reset_claim_nonce() {
        let km = setup(addr(1), 0x9);
        let reset = Operation::SetData {
            key: profile_guard_perms::claim_nonce_key(&addr(4)),
            value: Bytes::new(),
        };
        let err = km.execute_operation(&addr(1), reset).unwrap_err();
        assert!(matches!(err, ProfileError::NotAuthorised { ref permission, .. } if permission == "ADDPERMISSIONS"));
    }

    #[test]
    fn test_planning_happens_in_flight() {
        let km = setup(addr(1), 0x9);
        let key = DataKey::from_bytes([8; 32]);

        let nested = km
            .execute_planned(&addr(1), |profile| {
                let nested = km.execute_operation(&addr(1), Operation::SetData { key, value: Bytes::from_static(b"inner") });
                let seen = profile.get_data(&key)?;
                let op = Operation::SetData { key, value: Bytes::from_static(b"outer") };
                Ok((vec![op], (nested, seen)))
            })
            .unwrap();

        assert!(matches!(nested.0, Err(ProfileError::ReentrantCall(_))));
        assert!(nested.1.is_empty());
        assert_eq!(km.profile().get_data(&key).unwrap().as_ref(), b"outer");
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let km = setup(addr(1), 0x9);
        let ok = Operation::SetData {
            key: DataKey::from_bytes([6; 32]),
            value: Bytes::from_static(b"v"),
        };
        let denied = Operation::SetData {
            key: PermissionTable::Controller.permission_key(&addr(3)),
            value: BitMask::from_u128(1).to_value(),
        };
        assert!(km.execute_batch(&addr(1), &[ok, denied]).is_err());
        assert!(km.profile().get_data(&DataKey::from_bytes([6; 32])).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_selector() {
        let km = setup(addr(1), 0x1);
        let err = km.execute(&addr(1), &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, ProfileError::Core(_)));
    }
}
