/*!
 * Use Case Component
 * A small stateful component whose mutating operations are call-order guarded
 *
 * Each protected operation names its own selector and hands its body to the
 * registry guard, so the permission is spent only when the body succeeds.
 */

use crate::core::errors::CallError;
use crate::core::types::{ClientId, OperationId};
use crate::permissions::{CallGuard, PermissionRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors from the use case component
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error("Caller {caller} is not the owner")]
    NotOwner { caller: ClientId },

    #[error("Counter overflow adding {value} to {current}")]
    Overflow { current: u128, value: u128 },
}

pub type UseCaseResult<T> = Result<T, UseCaseError>;

pub struct UseCaseComponent {
    owner: ClientId,
    registry: Arc<PermissionRegistry>,
    number: Mutex<u128>,
}

impl UseCaseComponent {
    pub const CHANGE_DATA: &'static str = "changeData(uint256)";
    pub const INCREMENT_DATA: &'static str = "incrementData(uint256)";

    pub fn new(owner: ClientId, registry: Arc<PermissionRegistry>) -> Self {
        info!(owner = %owner, "Use case component deployed");
        Self {
            owner,
            registry,
            number: Mutex::new(0),
        }
    }

    pub fn change_data_selector() -> OperationId {
        OperationId::from_signature(Self::CHANGE_DATA)
    }

    pub fn increment_data_selector() -> OperationId {
        OperationId::from_signature(Self::INCREMENT_DATA)
    }

    /// Owner-only: replace `client`'s permissions
    pub fn call_allow_func_calls_for(
        &self,
        caller: ClientId,
        client: ClientId,
        operations: impl Into<Vec<OperationId>>,
        sequence: bool,
    ) -> UseCaseResult<()> {
        if caller != self.owner {
            return Err(UseCaseError::NotOwner { caller });
        }
        self.registry.grant(client, operations, sequence);
        Ok(())
    }

    /// Set the counter to `value`
    pub fn change_data(&self, caller: ClientId, value: u128) -> UseCaseResult<()> {
        self.registry
            .guarded(caller, Self::change_data_selector(), || -> UseCaseResult<()> {
                *self.number.lock() = value;
                Ok(())
            })
    }

    /// Add `value` to the counter
    pub fn increment_data(&self, caller: ClientId, value: u128) -> UseCaseResult<()> {
        self.registry
            .guarded(caller, Self::increment_data_selector(), || -> UseCaseResult<()> {
                let mut number = self.number.lock();
                *number = number.checked_add(value).ok_or(UseCaseError::Overflow {
                    current: *number,
                    value,
                })?;
                Ok(())
            })
    }

    pub fn number(&self) -> u128 {
        *self.number.lock()
    }

    pub fn owner(&self) -> ClientId {
        self.owner
    }

    pub fn registry(&self) -> &Arc<PermissionRegistry> {
        &self.registry
    }
}
