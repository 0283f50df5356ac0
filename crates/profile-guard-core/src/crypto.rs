//! Hashing and signature primitives.
//!
//! Key derivation uses keccak-256 so derived keys match the bytes already
//! stored by existing deployments. Signer recovery sits behind the
//! [`SignerRecovery`] trait; the bundled implementation verifies Ed25519
//! signatures that carry their public key, and maps that key to an
//! [`Address`] the same way an account address is derived from a key.

use bytes::Bytes;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::types::Address;

/// Prefix of an EIP-191 personal message.
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Length of a signature blob: public key followed by the signature.
pub const SIGNATURE_LEN: usize = 32 + 64;

/// Compute the keccak-256 hash of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a message the way `personal_sign` does before signing.
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Derive the address controlled by a public key.
pub fn address_of(public_key: &[u8; 32]) -> Address {
    let hash = keccak256(public_key);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}

/// Recovers the address that produced a signature over a message hash.
pub trait SignerRecovery: Send + Sync {
    /// Return the signing address, or an error if the signature is invalid.
    fn recover(&self, message_hash: &[u8; 32], signature: &[u8]) -> Result<Address>;
}

/// Recovery for `pubkey(32) || ed25519_signature(64)` blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Recovery;

impl SignerRecovery for Ed25519Recovery {
    fn recover(&self, message_hash: &[u8; 32], signature: &[u8]) -> Result<Address> {
        if signature.len() != SIGNATURE_LEN {
            return Err(CoreError::InvalidLength {
                expected: SIGNATURE_LEN,
                got: signature.len(),
            });
        }

        let mut pk = [0u8; 32];
        pk.copy_from_slice(&signature[..32]);
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&signature[32..]);

        let verifying_key = VerifyingKey::from_bytes(&pk).map_err(|_| CoreError::InvalidPublicKey)?;
        verifying_key
            .verify(message_hash, &Signature::from_bytes(&sig))
            .map_err(|_| CoreError::InvalidSignature)?;

        Ok(address_of(&pk))
    }
}

/// A signing identity.
///
/// Wraps an Ed25519 key; its [`Address`] is what permission tables store.
#[derive(Clone)]
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    /// Generate a new random signer.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The raw public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The address of this signer.
    pub fn address(&self) -> Address {
        address_of(&self.public_key())
    }

    /// Sign an already-hashed message, returning a recoverable blob.
    pub fn sign_hash(&self, message_hash: &[u8; 32]) -> Bytes {
        let sig = self.signing_key.sign(message_hash);
        let mut out = Vec::with_capacity(SIGNATURE_LEN);
        out.extend_from_slice(&self.public_key());
        out.extend_from_slice(&sig.to_bytes());
        Bytes::from(out)
    }

    /// Sign `message` as a personal message (EIP-191).
    pub fn sign_message(&self, message: &[u8]) -> Bytes {
        self.sign_hash(&hash_message(message))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({})", self.address())
    }
}
