//! DAO modules.
//!
//! Governance settings and the initial member table are written by the
//! profile owner at setup. Afterwards membership changes go through
//! [`DaoPermissions`] and vote delegation through [`DaoDelegates`], both of
//! which act on the profile via its key manager.

pub mod delegates;
pub mod permissions;
pub mod setup;

pub use delegates::DaoDelegates;
pub use permissions::DaoPermissions;
pub use setup::{grant_owner_change_owner, initialize_dao, register_controllers};
