//! One-time DAO setup, performed by the profile owner before control is
//! handed to a key manager.

use bytes::Bytes;
use profile_guard_core::keys::{
    self, DAO_MAJORITY, DAO_METADATA, DAO_MINIMUM_VOTING_DELAY, DAO_MINIMUM_VOTING_PERIOD,
    DAO_PARTICIPATION_RATE,
};
use profile_guard_core::{value, Address, BitMask, WriteBatch};
use profile_guard_perms::permissions::controller;
use profile_guard_perms::{plan_add_permissions, PermissionTable};
use profile_guard_store::{DataRead, DataStore, Staged};

use crate::config::DaoSettings;
use crate::error::Result;
use crate::profile::UniversalProfile;

/// Plan granting each `(address, mask)` in turn, later grants seeing
/// earlier ones.
pub(crate) fn plan_grants<R: DataRead + ?Sized>(
    reader: &R,
    table: PermissionTable,
    grants: impl IntoIterator<Item = (Address, BitMask)>,
) -> Result<WriteBatch> {
    let mut batch = WriteBatch::new();
    for (address, mask) in grants {
        let staged = Staged::new(reader, &batch);
        let grant = plan_add_permissions(&staged, table, &address, &mask)?;
        batch.extend(grant);
    }
    Ok(batch)
}

/// Write governance settings and the initial member table in one batch.
pub fn initialize_dao<S: DataStore>(
    profile: &UniversalProfile<S>,
    owner: &Address,
    settings: &DaoSettings,
) -> Result<()> {
    settings.validate()?;

    let mut batch = WriteBatch::new();
    batch
        .put(keys::encode_singleton(DAO_METADATA), Bytes::from(settings.metadata.clone().into_bytes()))
        .put(keys::encode_singleton(DAO_MAJORITY), vec![settings.majority])
        .put(keys::encode_singleton(DAO_PARTICIPATION_RATE), vec![settings.participation_rate])
        .put(
            keys::encode_singleton(DAO_MINIMUM_VOTING_DELAY),
            value::encode_uint(settings.minimum_voting_delay),
        )
        .put(
            keys::encode_singleton(DAO_MINIMUM_VOTING_PERIOD),
            value::encode_uint(settings.minimum_voting_period),
        );

    let members = settings.members.iter().map(|m| (m.address, m.permissions));
    let staged_members = {
        let staged = Staged::new(profile, &batch);
        plan_grants(&staged, PermissionTable::Dao, members)?
    };
    batch.extend(staged_members);

    profile.apply_batch(owner, &batch)?;
    tracing::info!(profile = %profile.address(), members = settings.members.len(), "dao initialized");
    Ok(())
}

/// Give the owner CHANGEOWNER so it can hand the profile to a key manager
/// and later reclaim it through one.
pub fn grant_owner_change_owner<S: DataStore>(profile: &UniversalProfile<S>, owner: &Address) -> Result<()> {
    let batch = plan_grants(profile, PermissionTable::Controller, [(*owner, controller::CHANGEOWNER)])?;
    profile.apply_batch(owner, &batch)
}

/// Register module controllers with every controller permission except
/// DELEGATECALL.
pub fn register_controllers<S: DataStore>(
    profile: &UniversalProfile<S>,
    owner: &Address,
    controllers: &[Address],
) -> Result<()> {
    let grants = controllers.iter().map(|c| (*c, controller::MODULE));
    let batch = plan_grants(profile, PermissionTable::Controller, grants)?;
    profile.apply_batch(owner, &batch)?;
    tracing::info!(profile = %profile.address(), count = controllers.len(), "controllers registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemberConfig;
    use profile_guard_perms::permissions_of;
    use profile_guard_store::MemoryStore;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn test_initialize_writes_settings_and_members() {
        let up = UniversalProfile::new(addr(0xaa), addr(1), MemoryStore::new());
        let settings = DaoSettings {
            metadata: "https://somelink.com/".into(),
            members: vec![
                MemberConfig::new(addr(1), BitMask::from_u128(0x7f)),
                MemberConfig::new(addr(2), BitMask::from_u128(0x0f)),
            ],
            ..DaoSettings::default()
        };
        initialize_dao(&up, &addr(1), &settings).unwrap();

        assert_eq!(up.get_data(&keys::encode_singleton(DAO_MAJORITY)).unwrap().as_ref(), &[50]);
        assert_eq!(
            up.get_data(&keys::encode_singleton(DAO_MINIMUM_VOTING_PERIOD)).unwrap(),
            value::encode_uint(60)
        );
        let registry = PermissionTable::Dao.registry();
        assert_eq!(registry.members(&up).unwrap(), vec![addr(1), addr(2)]);
        assert_eq!(permissions_of(&up, PermissionTable::Dao, &addr(2)).unwrap(), BitMask::from_u128(0x0f));
    }

    #[test]
    fn test_initialize_is_owner_only() {
        let up = UniversalProfile::new(addr(0xaa), addr(1), MemoryStore::new());
        assert!(initialize_dao(&up, &addr(2), &DaoSettings::default()).is_err());
        assert!(up.get_data(&keys::encode_singleton(DAO_MAJORITY)).unwrap().is_empty());
    }

    #[test]
    fn test_controllers_follow_owner() {
        let up = UniversalProfile::new(addr(0xaa), addr(1), MemoryStore::new());
        grant_owner_change_owner(&up, &addr(1)).unwrap();
        register_controllers(&up, &addr(1), &[addr(0x10), addr(0x11)]).unwrap();

        let registry = PermissionTable::Controller.registry();
        assert_eq!(registry.members(&up).unwrap(), vec![addr(1), addr(0x10), addr(0x11)]);
        assert_eq!(
            up.get_data(&PermissionTable::Controller.permission_key(&addr(0x11))).unwrap()[30..],
            [0x7f, 0xbf]
        );
    }
}
