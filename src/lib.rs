/*!
 * Call Order Control Library
 * Consumable, optionally ordered call permissions for guarded operations
 */

pub mod core;
pub mod monitoring;
pub mod permissions;
pub mod usecase;

// Re-exports
pub use crate::core::{
    CallError, CallResult, ClientId, ConfigError, DenialReason, OperationId, ParseIdError,
    RegistryConfig, SnapshotError,
};
pub use monitoring::init_tracing;
pub use permissions::{
    CallGuard, EventLog, GrantProvider, PermissionGrant, PermissionRegistry, PermissionSystem,
    RegistrySnapshot,
};
pub use usecase::{UseCaseComponent, UseCaseError};
