//! Permission evaluation.
//!
//! A caller holds `required` iff `(mask & required) == required`, where
//! `mask` is read from the table at `prefix ++ caller`. There is no owner
//! bypass: the profile owner is authorized only by what its mask says.

use profile_guard_core::{Address, BitMask};
use profile_guard_store::{DataRead, DataReadExt};

use crate::error::{PermsError, Result};
use crate::permissions::PermissionTable;

/// The mask `address` holds in `table`; zero when unset.
pub fn permissions_of<R: DataRead + ?Sized>(
    store: &R,
    table: PermissionTable,
    address: &Address,
) -> Result<BitMask> {
    Ok(store.get_mask(&table.permission_key(address))?)
}

/// Whether `address` holds every bit of `required` in `table`.
pub fn has_permission<R: DataRead + ?Sized>(
    store: &R,
    table: PermissionTable,
    address: &Address,
    required: &BitMask,
) -> Result<bool> {
    Ok(permissions_of(store, table, address)?.contains(required))
}

/// Fail with `NotAuthorised` unless `caller` holds every bit of `required`.
///
/// A malformed stored mask is an error, never a denial.
pub fn authorize<R: DataRead + ?Sized>(
    store: &R,
    table: PermissionTable,
    caller: &Address,
    required: &BitMask,
) -> Result<()> {
    let mask = permissions_of(store, table, caller)?;
    if mask.contains(required) {
        tracing::debug!(%caller, ?table, required = %table.describe(required), "authorized");
        Ok(())
    } else {
        let missing = required.without(&mask);
        tracing::warn!(%caller, ?table, missing = %table.describe(&missing), "not authorised");
        Err(PermsError::not_authorised(*caller, table.describe(&missing)))
    }
}
