//! Error types for profile-guard core primitives.

use thiserror::Error;

/// Errors raised while decoding keys, values, call payloads or signatures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("integer does not fit in {bits} bits")]
    IntegerOverflow { bits: u32 },

    #[error("abi decoding error: {0}")]
    AbiDecode(String),

    #[error("unknown function selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidHex(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
