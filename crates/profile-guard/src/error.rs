//! Error types for profile-guard.

use profile_guard_core::{Address, CoreError, ProposalId};
use profile_guard_perms::PermsError;
use profile_guard_store::StoreError;
use thiserror::Error;

/// Errors that can occur during profile, controller or module operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// `from` lacks the named permission.
    #[error("not authorised: {from} lacks {permission}")]
    NotAuthorised { from: Address, permission: String },

    /// An ownership-gated profile call from someone other than the owner
    /// (or, for a claim, the pending owner).
    #[error("unauthorized caller: {caller}")]
    Unauthorized { caller: Address },

    /// Parallel lists of different lengths.
    #[error("length mismatch: {keys} keys, {values} values")]
    LengthMismatch { keys: usize, values: usize },

    /// The address is already a member.
    #[error("already a member: {0}")]
    AlreadyMember(Address),

    /// The address is not a member.
    #[error("not a member: {0}")]
    NotMember(Address),

    /// No proposal is stored under this id.
    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// A proposal with no calls.
    #[error("empty proposal")]
    EmptyProposal,

    /// Too few approvals to execute.
    #[error("quorum not reached: {approvals} of {members} members approved, {quorum}% required")]
    QuorumNotReached {
        approvals: usize,
        members: u128,
        quorum: u8,
    },

    /// A proposal call aimed at something other than the profile.
    #[error("unsupported call target: {0}")]
    UnsupportedTarget(Address),

    /// A nested call into a controller that is already executing.
    #[error("re-entrant call into key manager {0}")]
    ReentrantCall(Address),

    /// Delegation rules violated.
    #[error("invalid delegation: {0}")]
    InvalidDelegation(String),

    /// Permission error without a dedicated variant.
    #[error("permission error: {0}")]
    Permission(PermsError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Core error (decoding, signatures).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Configuration values out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<PermsError> for ProfileError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::NotAuthorised { from, permission } => ProfileError::NotAuthorised { from, permission },
            PermsError::AlreadyMember(address) => ProfileError::AlreadyMember(address),
            PermsError::NotMember(address) => ProfileError::NotMember(address),
            PermsError::Store(e) => ProfileError::Store(e),
            PermsError::Core(e) => ProfileError::Core(e),
            other => ProfileError::Permission(other),
        }
    }
}

/// Result type for profile-guard operations.
pub type Result<T> = std::result::Result<T, ProfileError>;
