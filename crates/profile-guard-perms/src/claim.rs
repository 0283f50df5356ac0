//! Delegated permission claims.
//!
//! An authority signs a digest off-line; the grantee redeems it later.
//! The digest covers the grantee's claim nonce, and redeeming bumps the
//! nonce, so each signature is good for exactly one claim. It also covers
//! the profile and the module redeeming it, so a signature made for one
//! DAO is worthless on another.

use profile_guard_core::keys::{self, DAO_CLAIM_NONCE};
use profile_guard_core::{hash_message, keccak256, value, Address, BitMask, DataKey, SignerRecovery, WriteBatch};
use profile_guard_store::{DataRead, DataReadExt, Staged};

use crate::error::{PermsError, Result};
use crate::evaluator::permissions_of;
use crate::grant::plan_add_permissions;
use crate::permissions::{dao, PermissionTable};

/// Domain tag mixed into claim digests.
const CLAIM_DOMAIN: &[u8] = b"DaoPermissionClaim";

/// Where a claim may be redeemed: the profile holding the DAO table and
/// the module accepting the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimScope {
    pub profile: Address,
    pub module: Address,
}

/// Key of `grantee`'s claim nonce.
pub fn claim_nonce_key(grantee: &Address) -> DataKey {
    keys::encode_address_mapping(&keys::mapping_prefix(DAO_CLAIM_NONCE), grantee)
}

/// Claims `grantee` has redeemed so far.
pub fn claim_nonce<R: DataRead + ?Sized>(store: &R, grantee: &Address) -> Result<u128> {
    Ok(store.get_uint(&claim_nonce_key(grantee))?)
}

/// `keccak256(tag ++ profile ++ module ++ authority ++ grantee ++ permission ++ uint256(nonce))`.
pub fn new_permission_hash<R: DataRead + ?Sized>(
    store: &R,
    scope: &ClaimScope,
    authority: &Address,
    grantee: &Address,
    permission: &BitMask,
) -> Result<[u8; 32]> {
    let nonce = claim_nonce(store, grantee)?;

    let mut preimage = Vec::with_capacity(CLAIM_DOMAIN.len() + 20 * 4 + 32 + 32);
    preimage.extend_from_slice(CLAIM_DOMAIN);
    preimage.extend_from_slice(scope.profile.as_bytes());
    preimage.extend_from_slice(scope.module.as_bytes());
    preimage.extend_from_slice(authority.as_bytes());
    preimage.extend_from_slice(grantee.as_bytes());
    preimage.extend_from_slice(permission.as_bytes());
    preimage.extend_from_slice(&value::encode_uint(nonce));
    Ok(keccak256(&preimage))
}

/// Check a claim and plan its effects.
///
/// The signature must be `authority`'s personal-message signature over
/// [`new_permission_hash`] for `scope`. The authority must hold
/// ADD_PERMISSION and every bit it hands out. On success the batch merges
/// `permission` into the grantee's DAO mask, enrolls the grantee if needed
/// and bumps the grantee's nonce.
pub fn verify_claim<R: DataRead + ?Sized>(
    store: &R,
    recovery: &dyn SignerRecovery,
    scope: &ClaimScope,
    authority: &Address,
    grantee: &Address,
    permission: &BitMask,
    signature: &[u8],
) -> Result<WriteBatch> {
    let digest = new_permission_hash(store, scope, authority, grantee, permission)?;
    let signer = match recovery.recover(&hash_message(&digest), signature) {
        Ok(signer) => signer,
        Err(e) => {
            tracing::warn!(%authority, %grantee, error = %e, "claim signature rejected");
            return Err(PermsError::not_authorised(*grantee, "valid claim signature"));
        }
    };
    if signer != *authority {
        tracing::warn!(%authority, %signer, "claim signed by someone else");
        return Err(PermsError::not_authorised(signer, "claim authority"));
    }

    let table = PermissionTable::Dao;
    let held = permissions_of(store, table, authority)?;
    let needed = *permission | dao::ADD_PERMISSION;
    if !held.contains(&needed) {
        let missing = needed.without(&held);
        return Err(PermsError::not_authorised(*authority, table.describe(&missing)));
    }

    let nonce = claim_nonce(store, grantee)?;
    let mut batch = WriteBatch::new();
    batch.put(claim_nonce_key(grantee), value::encode_uint(nonce + 1));
    let staged = Staged::new(store, &batch);
    let grant = plan_add_permissions(&staged, table, grantee, permission)?;
    batch.extend(grant);

    tracing::info!(%authority, %grantee, permission = %table.describe(permission), "permission claimed");
    Ok(batch)
}
