//! # profile-guard Testkit
//!
//! Testing utilities for profile-guard.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: derived storage keys pinned to their expected bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: deployed DAO and multisig worlds, ready to act on
//!
//! ## Golden Vectors
//!
//! Golden vectors keep the storage layout stable across releases:
//!
//! ```rust
//! use profile_guard_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     vector.verify().unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use profile_guard_testkit::generators::dao_settings;
//!
//! proptest! {
//!     #[test]
//!     fn settings_validate(settings in dao_settings()) {
//!         prop_assert!(settings.validate().is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use profile_guard_testkit::fixtures::DaoWorld;
//!
//! let world = DaoWorld::deploy().unwrap();
//! assert!(world.key_manager.is_profile_owner());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{contract, signer, DaoWorld, MultisigWorld};
pub use generators::RegistryOp;
pub use vectors::{all_vectors, verify_all_vectors, KeyVector};
