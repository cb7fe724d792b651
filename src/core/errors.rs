/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{ClientId, OperationId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for guarded calls
pub type CallResult<T> = Result<T, CallError>;

/// Why a call was rejected. Detail only; every rejection is the same error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DenialReason {
    /// Client has never been granted anything
    NoGrant,
    /// Every slot of the sequence has been used
    SequenceExhausted { length: usize },
    /// Next slot in the sequence is a different operation
    OutOfOrder {
        expected: OperationId,
        position: usize,
    },
    /// No uses of this operation left (or never granted)
    BudgetExhausted,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NoGrant => write!(f, "no grant"),
            DenialReason::SequenceExhausted { length } => {
                write!(f, "sequence of {} calls exhausted", length)
            }
            DenialReason::OutOfOrder { expected, position } => {
                write!(f, "expected {} at position {}", expected, position)
            }
            DenialReason::BudgetExhausted => write!(f, "no calls left"),
        }
    }
}

/// Guarded call errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum CallError {
    #[error("Call {operation} not allowed for {client}: {reason}")]
    #[diagnostic(
        code(call_order::not_allowed_call),
        help("Ask the administrator for a new grant covering this operation.")
    )]
    NotAllowedCall {
        client: ClientId,
        operation: OperationId,
        reason: DenialReason,
    },
}

impl CallError {
    pub fn not_allowed(client: ClientId, operation: OperationId, reason: DenialReason) -> Self {
        CallError::NotAllowedCall {
            client,
            operation,
            reason,
        }
    }

    pub fn reason(&self) -> DenialReason {
        match self {
            CallError::NotAllowedCall { reason, .. } => *reason,
        }
    }
}

/// Malformed identifier text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("Invalid {kind} length: expected {expected} hex digits, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {kind} hex: {reason}")]
    InvalidHex { kind: &'static str, reason: String },
}

/// Persisted registry state that cannot be restored
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SnapshotError {
    #[error("Duplicate record for client {client}")]
    #[diagnostic(code(call_order::snapshot::duplicate_client))]
    DuplicateClient { client: ClientId },

    #[error("Sequence progress {progress} exceeds {length} allowed calls for {client}")]
    #[diagnostic(code(call_order::snapshot::progress_out_of_range))]
    ProgressOutOfRange {
        client: ClientId,
        progress: usize,
        length: usize,
    },

    #[error("Remaining count {remaining} for {operation} exceeds granted {granted} for {client}")]
    #[diagnostic(
        code(call_order::snapshot::count_out_of_range),
        help("Remaining counts can only be spent down from the granted occurrence count.")
    )]
    CountOutOfRange {
        client: ClientId,
        operation: OperationId,
        remaining: u32,
        granted: u32,
    },

    #[error("Record for {client} mixes sequence progress with remaining counts")]
    #[diagnostic(code(call_order::snapshot::mixed_mode))]
    MixedMode { client: ClientId },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    #[diagnostic(
        code(call_order::config::invalid),
        help("Unset the variable to use the default.")
    )]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
