//! # profile-guard
//!
//! Permission-guarded account data: a key-value account ("universal
//! profile"), the key manager that owns it, and the DAO and multisig
//! modules that act on it.
//!
//! ## Overview
//!
//! - **Profile**: flat map of 32-byte keys to byte values, with two-step
//!   ownership. Only the owner writes.
//! - **Key manager**: owns the profile and forwards calls from controllers
//!   whose permission mask (stored in the profile itself) allows them.
//! - **Modules**: DAO permissions, DAO delegation and multisig. Each is a
//!   controller of the key manager and checks its own callers against its
//!   own permission table.
//!
//! ## Key Concepts
//!
//! - **Bitmask permission**: a caller holds P iff `(mask & P) == P`
//! - **Two-step ownership**: `transfer_ownership` nominates, `claim_ownership`
//!   completes
//! - **Atomic batches**: every logical operation commits one write batch
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use profile_guard::{KeyManager, KeyManagerConfig, UniversalProfile};
//! use profile_guard::core::{Address, Operation};
//! use profile_guard::store::SqliteStore;
//!
//! let owner = Address::from_bytes([1; 20]);
//! let km_address = Address::from_bytes([2; 20]);
//!
//! let store = SqliteStore::open("profile.db").unwrap();
//! let profile = Arc::new(UniversalProfile::deploy(Address::from_bytes([3; 20]), owner, store, None).unwrap());
//! profile_guard::dao::grant_owner_change_owner(&profile, &owner).unwrap();
//!
//! // Hand the profile to a key manager.
//! profile.transfer_ownership(&owner, km_address).unwrap();
//! let km = KeyManager::new(km_address, profile.clone(), KeyManagerConfig::default());
//! km.execute(&owner, &Operation::ClaimOwnership.encode()).unwrap();
//! assert!(km.is_profile_owner());
//! ```
//!
//! ## Re-exports
//!
//! - `profile_guard::core` - keys, masks, ABI payloads, signatures
//! - `profile_guard::store` - storage traits, SQLite and in-memory backends
//! - `profile_guard::perms` - permission tables, registries, claims

pub mod config;
pub mod dao;
pub mod error;
pub mod key_manager;
mod module;
pub mod multisig;
pub mod profile;

// Re-export component crates
pub use profile_guard_core as core;
pub use profile_guard_perms as perms;
pub use profile_guard_store as store;

// Re-export main types for convenience
pub use config::{DaoSettings, MemberConfig, MultisigSettings};
pub use dao::{DaoDelegates, DaoPermissions};
pub use error::{ProfileError, Result};
pub use key_manager::{KeyManager, KeyManagerConfig};
pub use multisig::{initialize_multisig, Multisig, Proposal};
pub use profile::{DataChangedListener, Ownership, UniversalProfile};

// Re-export commonly used core types
pub use profile_guard_core::{Address, BitMask, DataKey, Operation, ProposalId, Signer};
