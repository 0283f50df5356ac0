//! # profile-guard permissions
//!
//! Bitmask access control over account data.
//!
//! ## Overview
//!
//! Permissions are 256-bit masks stored directly in the account's key-value
//! data, one key per (table, address). A caller holds a permission iff its
//! mask contains every required bit. Members of a table are also tracked in
//! an array-backed [`Registry`] so they can be enumerated.
//!
//! ## Key Concepts
//!
//! - **Table**: controller, DAO or multisig masks ([`PermissionTable`])
//! - **Registry**: swap-delete member array with a reverse index
//! - **Claim**: an authority's signed, single-use grant redeemed by the grantee
//!
//! Operations that change state return a [`profile_guard_core::WriteBatch`]
//! instead of writing, so the caller decides how the change is committed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use profile_guard_core::{Address, BitMask};
//! use profile_guard_perms::{authorize, plan_add_permissions, PermissionTable};
//! use profile_guard_store::{DataStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let member = Address::from_bytes([1; 20]);
//! let batch = plan_add_permissions(&store, PermissionTable::Dao, &member, &BitMask::from_u128(0x3)).unwrap();
//! store.apply(&batch).unwrap();
//! authorize(&store, PermissionTable::Dao, &member, &BitMask::from_u128(0x1)).unwrap();
//! ```

pub mod claim;
pub mod error;
pub mod evaluator;
pub mod grant;
pub mod permissions;
pub mod registry;

pub use claim::{claim_nonce, claim_nonce_key, new_permission_hash, verify_claim, ClaimScope};
pub use error::{PermsError, Result};
pub use evaluator::{authorize, has_permission, permissions_of};
pub use grant::{plan_add_permissions, plan_remove_permissions};
pub use permissions::PermissionTable;
pub use registry::Registry;
