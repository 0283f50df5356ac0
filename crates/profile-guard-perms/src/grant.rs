//! Planned permission changes.
//!
//! Granting merges bits into a member's mask and enrolls new members in the
//! table's registry; revoking clears bits and drops members whose mask
//! reaches zero. Both return a batch for the caller to commit.

use profile_guard_core::{Address, BitMask, WriteBatch};
use profile_guard_store::{DataRead, Staged};

use crate::error::Result;
use crate::evaluator::permissions_of;
use crate::permissions::PermissionTable;

/// Plan `mask(target) |= mask`, joining the registry if `target` is new.
///
/// Granting the zero mask plans nothing.
pub fn plan_add_permissions<R: DataRead + ?Sized>(
    store: &R,
    table: PermissionTable,
    target: &Address,
    mask: &BitMask,
) -> Result<WriteBatch> {
    let mut batch = WriteBatch::new();
    if mask.is_zero() {
        return Ok(batch);
    }

    let current = permissions_of(store, table, target)?;
    batch.put(table.permission_key(target), (current | *mask).to_value());

    let registry = table.registry();
    if !registry.is_member(store, target)? {
        batch.extend(registry.plan_add(store, target)?);
    }
    Ok(batch)
}

/// Plan `mask(target) &= !mask`, leaving the registry when nothing remains.
///
/// A target that holds none of the bits plans nothing.
pub fn plan_remove_permissions<R: DataRead + ?Sized>(
    store: &R,
    table: PermissionTable,
    target: &Address,
    mask: &BitMask,
) -> Result<WriteBatch> {
    let mut batch = WriteBatch::new();
    let current = permissions_of(store, table, target)?;
    if !current.intersects(mask) {
        return Ok(batch);
    }

    let remaining = current.without(mask);
    batch.put(table.permission_key(target), remaining.to_value());

    let registry = table.registry();
    if remaining.is_zero() && registry.is_member(store, target)? {
        let staged = Staged::new(store, &batch);
        let leave = registry.plan_remove(&staged, target)?;
        batch.extend(leave);
    }
    Ok(batch)
}
