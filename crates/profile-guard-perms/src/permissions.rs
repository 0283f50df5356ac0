//! Permission bit tables.
//!
//! Three tables share the same evaluation rule but live under different
//! key prefixes: controller permissions (checked by the key manager),
//! DAO permissions and multisig permissions (checked by the modules).

use profile_guard_core::keys::{self, KeyPrefix, MULTISIG_PERMISSIONS_PREFIX};
use profile_guard_core::{Address, ArrayKey, BitMask, DataKey};

use crate::registry::Registry;

/// Controller-level bits, checked before the profile is touched.
pub mod controller {
    use profile_guard_core::BitMask;

    pub const CHANGEOWNER: BitMask = BitMask::from_u128(0x1);
    pub const CHANGEPERMISSIONS: BitMask = BitMask::from_u128(0x2);
    pub const ADDPERMISSIONS: BitMask = BitMask::from_u128(0x4);
    pub const SETDATA: BitMask = BitMask::from_u128(0x8);
    pub const CALL: BitMask = BitMask::from_u128(0x10);
    pub const STATICCALL: BitMask = BitMask::from_u128(0x20);
    pub const DELEGATECALL: BitMask = BitMask::from_u128(0x40);
    pub const DEPLOY: BitMask = BitMask::from_u128(0x80);
    pub const TRANSFERVALUE: BitMask = BitMask::from_u128(0x100);
    pub const SIGN: BitMask = BitMask::from_u128(0x200);
    pub const SUPER_SETDATA: BitMask = BitMask::from_u128(0x400);
    pub const SUPER_TRANSFERVALUE: BitMask = BitMask::from_u128(0x800);
    pub const SUPER_CALL: BitMask = BitMask::from_u128(0x1000);
    pub const SUPER_STATICCALL: BitMask = BitMask::from_u128(0x2000);
    pub const SUPER_DELEGATECALL: BitMask = BitMask::from_u128(0x4000);

    /// Granted to module controllers: everything but DELEGATECALL.
    pub const MODULE: BitMask = BitMask::from_u128(0x7fbf);

    pub(crate) const NAMES: &[(&str, BitMask)] = &[
        ("CHANGEOWNER", CHANGEOWNER),
        ("CHANGEPERMISSIONS", CHANGEPERMISSIONS),
        ("ADDPERMISSIONS", ADDPERMISSIONS),
        ("SETDATA", SETDATA),
        ("CALL", CALL),
        ("STATICCALL", STATICCALL),
        ("DELEGATECALL", DELEGATECALL),
        ("DEPLOY", DEPLOY),
        ("TRANSFERVALUE", TRANSFERVALUE),
        ("SIGN", SIGN),
        ("SUPER_SETDATA", SUPER_SETDATA),
        ("SUPER_TRANSFERVALUE", SUPER_TRANSFERVALUE),
        ("SUPER_CALL", SUPER_CALL),
        ("SUPER_STATICCALL", SUPER_STATICCALL),
        ("SUPER_DELEGATECALL", SUPER_DELEGATECALL),
    ];
}

/// DAO member bits.
pub mod dao {
    use profile_guard_core::BitMask;

    pub const VOTE: BitMask = BitMask::from_u128(0x1);
    pub const PROPOSE: BitMask = BitMask::from_u128(0x2);
    pub const EXECUTE: BitMask = BitMask::from_u128(0x4);
    pub const REGISTER_VOTES: BitMask = BitMask::from_u128(0x8);
    pub const ADD_PERMISSION: BitMask = BitMask::from_u128(0x10);
    pub const REMOVE_PERMISSION: BitMask = BitMask::from_u128(0x20);
    pub const SEND_DELEGATE: BitMask = BitMask::from_u128(0x40);
    pub const RECEIVE_DELEGATE: BitMask = BitMask::from_u128(0x80);

    pub(crate) const NAMES: &[(&str, BitMask)] = &[
        ("VOTE", VOTE),
        ("PROPOSE", PROPOSE),
        ("EXECUTE", EXECUTE),
        ("REGISTER_VOTES", REGISTER_VOTES),
        ("ADD_PERMISSION", ADD_PERMISSION),
        ("REMOVE_PERMISSION", REMOVE_PERMISSION),
        ("SEND_DELEGATE", SEND_DELEGATE),
        ("RECEIVE_DELEGATE", RECEIVE_DELEGATE),
    ];
}

/// Multisig member bits.
pub mod multisig {
    use profile_guard_core::BitMask;

    pub const VOTE: BitMask = BitMask::from_u128(0x1);
    pub const PROPOSE: BitMask = BitMask::from_u128(0x2);
    pub const ADD_PERMISSION: BitMask = BitMask::from_u128(0x4);
    pub const REMOVE_PERMISSION: BitMask = BitMask::from_u128(0x8);
    pub const EXECUTE: BitMask = BitMask::from_u128(0x10);

    pub(crate) const NAMES: &[(&str, BitMask)] = &[
        ("VOTE", VOTE),
        ("PROPOSE", PROPOSE),
        ("ADD_PERMISSION", ADD_PERMISSION),
        ("REMOVE_PERMISSION", REMOVE_PERMISSION),
        ("EXECUTE", EXECUTE),
    ];
}

/// Which permission table a mask belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionTable {
    /// `AddressPermissions:Permissions:<address>`
    Controller,
    /// `AddressPermissions:DaoPermissions:<address>`
    Dao,
    /// `AddresMult0000<address>`
    Multisig,
}

impl PermissionTable {
    /// Prefix of this table's address-mapped keys.
    pub fn prefix(&self) -> KeyPrefix {
        match self {
            PermissionTable::Controller => keys::controller_permissions_prefix(),
            PermissionTable::Dao => keys::dao_permissions_prefix(),
            PermissionTable::Multisig => MULTISIG_PERMISSIONS_PREFIX,
        }
    }

    /// Key holding `address`'s mask in this table.
    pub fn permission_key(&self, address: &Address) -> DataKey {
        keys::encode_address_mapping(&self.prefix(), address)
    }

    /// The registry listing every address with a mask in this table.
    pub fn registry(&self) -> Registry {
        let name = match self {
            PermissionTable::Controller => keys::ADDRESS_PERMISSIONS_ARRAY,
            PermissionTable::Dao => keys::DAO_PARTICIPANTS,
            PermissionTable::Multisig => keys::MULTISIG_PARTICIPANTS,
        };
        Registry::new(ArrayKey::named(name))
    }

    fn names(&self) -> &'static [(&'static str, BitMask)] {
        match self {
            PermissionTable::Controller => controller::NAMES,
            PermissionTable::Dao => dao::NAMES,
            PermissionTable::Multisig => multisig::NAMES,
        }
    }

    /// Name of every known bit set in `mask`, lowest first.
    pub fn permission_names(&self, mask: &BitMask) -> Vec<&'static str> {
        self.names()
            .iter()
            .filter(|(_, bit)| mask.contains(bit))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Human-readable form of `mask`: known names joined by `|`, unknown
    /// bits as hex.
    pub fn describe(&self, mask: &BitMask) -> String {
        let mut parts: Vec<String> = self
            .permission_names(mask)
            .into_iter()
            .map(String::from)
            .collect();

        let known = self
            .names()
            .iter()
            .fold(BitMask::ZERO, |acc, (_, bit)| acc | *bit);
        let unknown = mask.without(&known);
        if !unknown.is_zero() {
            parts.push(unknown.to_string());
        }

        if parts.is_empty() {
            "NONE".to_string()
        } else {
            parts.join("|")
        }
    }
}
