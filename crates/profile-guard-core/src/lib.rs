//! # profile-guard core
//!
//! Pure primitives for profile-guard: data keys, permission bitmasks, the key
//! codec, value codecs, ABI call payloads and signature recovery.
//!
//! This crate does no I/O. Everything here is deterministic computation
//! over bytes, so derived keys can be reproduced by any implementation.
//!
//! ## Key Types
//!
//! - [`Address`] - 20-byte account address
//! - [`DataKey`] - 32-byte key into the account store
//! - [`BitMask`] - 256-bit permission mask
//! - [`WriteBatch`] - ordered writes applied atomically
//! - [`Operation`] - a typed, decoded profile call
//!
//! ## Key Layouts
//!
//! See the [`keys`] module for singleton, array and mapping derivations.

pub mod abi;
pub mod batch;
pub mod call;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod mask;
pub mod types;
pub mod value;

pub use abi::{decode_address_array, decode_bytes_array, encode_address_array, encode_bytes_array};
pub use batch::WriteBatch;
pub use call::Operation;
pub use crypto::{hash_message, keccak256, Ed25519Recovery, Signer, SignerRecovery};
pub use error::{CoreError, Result};
pub use keys::{ArrayKey, KeyPrefix};
pub use mask::BitMask;
pub use types::{Address, DataKey, ProposalId};
