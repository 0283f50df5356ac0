//! Error types for the permissions module.

use profile_guard_core::{Address, CoreError};
use profile_guard_store::StoreError;
use thiserror::Error;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// `from` lacks the named permission.
    #[error("not authorised: {from} lacks {permission}")]
    NotAuthorised { from: Address, permission: String },

    /// The address is already in the registry.
    #[error("already a member: {0}")]
    AlreadyMember(Address),

    /// The address is not in the registry.
    #[error("not a member: {0}")]
    NotMember(Address),

    /// Registry keys disagree with each other.
    #[error("registry corrupted: {0}")]
    CorruptRegistry(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl PermsError {
    pub fn not_authorised(from: Address, permission: impl Into<String>) -> Self {
        PermsError::NotAuthorised {
            from,
            permission: permission.into(),
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
