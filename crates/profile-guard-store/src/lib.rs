//! # profile-guard store
//!
//! Storage abstraction for profile-guard. Account data is a flat map from
//! 32-byte keys to byte values, kept behind the [`DataStore`] trait so the
//! profile and its controllers are storage-agnostic.
//!
//! ## Key Types
//!
//! - [`DataRead`] - read access; unset keys read as empty bytes
//! - [`DataStore`] - read/write access with atomic batches
//! - [`DataReadExt`] - typed reads (integers, masks, addresses)
//! - [`Staged`] - a view that overlays pending writes on a reader
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - in-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use profile_guard_core::DataKey;
//! use profile_guard_store::{DataRead, DataStore, SqliteStore};
//!
//! let store = SqliteStore::open("profile.db").unwrap();
//! let key = DataKey::from_bytes([1; 32]);
//! store.set(key, Bytes::from_static(b"hello")).unwrap();
//! assert_eq!(store.get(&key).unwrap().as_ref(), b"hello");
//! ```
//!
//! ## Design Notes
//!
//! - **Empty means absent**: writing an empty value deletes the entry
//! - **Atomic batches**: a [`profile_guard_core::WriteBatch`] is applied
//!   entirely or not at all

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{DataRead, DataReadExt, DataStore, Staged};
