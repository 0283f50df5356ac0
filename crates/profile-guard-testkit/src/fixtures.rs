//! Test fixtures and helpers.
//!
//! Deployed worlds matching the usual setup: a profile, its key manager,
//! and the modules registered as controllers, with ownership already handed
//! to the key manager.

use std::sync::Arc;

use profile_guard::dao::{grant_owner_change_owner, initialize_dao, register_controllers};
use profile_guard::{
    initialize_multisig, DaoDelegates, DaoPermissions, DaoSettings, KeyManager, KeyManagerConfig,
    MemberConfig, Multisig, MultisigSettings, Operation, Result, UniversalProfile,
};
use profile_guard_core::{Address, BitMask, Signer};
use profile_guard_store::{DataStore, MemoryStore};

/// A deterministic signer; `n` selects the seed.
pub fn signer(n: u8) -> Signer {
    let mut seed = [0u8; 32];
    seed[0] = 0x5e;
    seed[31] = n;
    Signer::from_seed(&seed)
}

/// A deterministic non-signing address (contracts, modules).
pub fn contract(n: u8) -> Address {
    let mut bytes = [0xc0; 20];
    bytes[19] = n;
    Address::from_bytes(bytes)
}

fn hand_over<S: DataStore>(profile: &Arc<UniversalProfile<S>>, owner: &Signer, key_manager: &KeyManager<S>) -> Result<()> {
    profile.transfer_ownership(&owner.address(), key_manager.address())?;
    key_manager.execute(&owner.address(), &Operation::ClaimOwnership.encode())?;
    Ok(())
}

/// A profile governed by the DAO modules.
///
/// Members: `owner` and `accounts[0]` hold `0x7f`, `accounts[1]` holds
/// `0x0f`; `accounts[2]` and `accounts[3]` are outsiders.
pub struct DaoWorld<S: DataStore = MemoryStore> {
    pub owner: Signer,
    pub accounts: Vec<Signer>,
    pub receiver_delegate: Address,
    pub profile: Arc<UniversalProfile<S>>,
    pub key_manager: Arc<KeyManager<S>>,
    pub permissions: DaoPermissions<S>,
    pub delegates: DaoDelegates<S>,
}

impl DaoWorld<MemoryStore> {
    pub fn deploy() -> Result<Self> {
        Self::deploy_on(MemoryStore::new())
    }
}

impl<S: DataStore> DaoWorld<S> {
    pub fn deploy_on(store: S) -> Result<Self> {
        Self::deploy_with(store, contract(0xaa))
    }

    /// Same members and modules, on a profile at `profile_address`.
    pub fn deploy_with(store: S, profile_address: Address) -> Result<Self> {
        let owner = signer(0);
        let accounts: Vec<Signer> = (1..=4).map(signer).collect();
        let receiver_delegate = contract(0xd0);

        let profile = Arc::new(UniversalProfile::deploy(
            profile_address,
            owner.address(),
            store,
            Some(receiver_delegate),
        )?);

        let settings = DaoSettings {
            metadata: "https://somelink.com/".into(),
            members: vec![
                MemberConfig::new(owner.address(), BitMask::from_u128(0x7f)),
                MemberConfig::new(accounts[0].address(), BitMask::from_u128(0x7f)),
                MemberConfig::new(accounts[1].address(), BitMask::from_u128(0x0f)),
            ],
            ..DaoSettings::default()
        };
        initialize_dao(&profile, &owner.address(), &settings)?;

        let key_manager = Arc::new(KeyManager::new(contract(0xee), profile.clone(), KeyManagerConfig::default()));
        let permissions = DaoPermissions::new(contract(0x01), key_manager.clone());
        let delegates = DaoDelegates::new(contract(0x02), key_manager.clone());

        grant_owner_change_owner(&profile, &owner.address())?;
        register_controllers(&profile, &owner.address(), &[permissions.address(), delegates.address()])?;
        hand_over(&profile, &owner, &key_manager)?;

        Ok(Self {
            owner,
            accounts,
            receiver_delegate,
            profile,
            key_manager,
            permissions,
            delegates,
        })
    }
}

/// A profile governed by the multisig module.
///
/// Members: `owner` holds `0x0f`, `accounts[0]` and `accounts[1]` hold
/// VOTE; quorum is 50%. `accounts[2]` is an outsider.
pub struct MultisigWorld<S: DataStore = MemoryStore> {
    pub owner: Signer,
    pub accounts: Vec<Signer>,
    pub profile: Arc<UniversalProfile<S>>,
    pub key_manager: Arc<KeyManager<S>>,
    pub multisig: Multisig<S>,
}

impl MultisigWorld<MemoryStore> {
    pub fn deploy() -> Result<Self> {
        Self::deploy_on(MemoryStore::new())
    }
}

impl<S: DataStore> MultisigWorld<S> {
    pub fn deploy_on(store: S) -> Result<Self> {
        let owner = signer(0x10);
        let accounts: Vec<Signer> = (0x11..=0x13).map(signer).collect();

        let profile = Arc::new(UniversalProfile::new(contract(0xab), owner.address(), store));
        let key_manager = Arc::new(KeyManager::new(contract(0xef), profile.clone(), KeyManagerConfig::default()));
        let multisig = Multisig::new(contract(0x03), key_manager.clone());

        grant_owner_change_owner(&profile, &owner.address())?;
        register_controllers(&profile, &owner.address(), &[multisig.address()])?;

        let settings = MultisigSettings {
            quorum: 50,
            members: vec![
                MemberConfig::new(owner.address(), BitMask::from_u128(0x0f)),
                MemberConfig::new(accounts[0].address(), BitMask::from_u128(0x01)),
                MemberConfig::new(accounts[1].address(), BitMask::from_u128(0x01)),
            ],
        };
        initialize_multisig(&profile, &owner.address(), &settings)?;
        hand_over(&profile, &owner, &key_manager)?;

        Ok(Self {
            owner,
            accounts,
            profile,
            key_manager,
            multisig,
        })
    }
}
