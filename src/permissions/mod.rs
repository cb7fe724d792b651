/*!
 * Permissions Module
 * Consumable, optionally ordered call permissions per client
 *
 * An administrator grants a client a list of operation selectors. Every
 * protected operation of a consuming component then spends one unit of that
 * list as its first step, or fails with `NotAllowedCall` and changes nothing.
 *
 * ## Consumption modes
 * - Sequence: the list must be walked exactly in order, each slot once
 * - Multiset: any order, each selector usable as often as it was listed
 *
 * A new grant always replaces the previous one wholesale.
 *
 * ## Usage
 * ```ignore
 * use call_order_control::permissions::{CallGuard, PermissionRegistry};
 * use call_order_control::OperationId;
 *
 * let registry = PermissionRegistry::new();
 * let change = OperationId::from_signature("changeData(uint256)");
 *
 * registry.grant(client, vec![change], true);
 *
 * // First statement of the protected operation
 * registry.check_and_consume(client, change)?;
 * ```
 */

pub mod audit;
pub mod registry;
pub mod types;

// Re-export commonly used items
pub use audit::{AuditSeverity, EventKind, EventLog, EventStats, RegistryEvent};
pub use registry::PermissionRegistry;
pub use types::{
    CallGuard, ClientRecord, ConsumptionMode, GrantProvider, PermissionGrant, PermissionSystem,
    RegistrySnapshot, RemainingCounts,
};
