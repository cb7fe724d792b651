/*!
 * Permission Traits
 * Interfaces consumers program against
 */

use crate::core::errors::{CallError, CallResult};
use crate::core::types::{ClientId, OperationId};

/// Guard interface: the first call of every protected operation
pub trait CallGuard: Send + Sync {
    /// Spend one unit of `client`'s permission for `operation`, or fail with
    /// `NotAllowedCall` leaving every grant untouched
    fn check_and_consume(&self, client: ClientId, operation: OperationId) -> CallResult<()>;

    /// Run `body` only if the call is allowed, and spend the permission only
    /// if `body` succeeds
    ///
    /// `body` runs while the client's grant is locked and must not call back
    /// into the same guard.
    fn guarded<T, E, F>(&self, client: ClientId, operation: OperationId, body: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<CallError>,
        F: FnOnce() -> Result<T, E>;
}

/// Read access to granted permissions
pub trait GrantProvider: Send + Sync {
    /// Granted list as submitted, regardless of consumption
    fn allowed_calls(&self, client: ClientId) -> Vec<OperationId>;

    /// Whether the current grant must be consumed in order
    fn is_sequence(&self, client: ClientId) -> bool;
}

/// Combined interface
pub trait PermissionSystem: CallGuard + GrantProvider {}
