/*!
 * Permission Types Module
 * Core types and traits for the permission registry
 */

mod core;
mod traits;

pub use self::core::{
    ClientRecord, ConsumptionMode, PermissionGrant, RegistrySnapshot, RemainingCounts,
};
pub use traits::{CallGuard, GrantProvider, PermissionSystem};
