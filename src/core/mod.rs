/*!
 * Core Module
 * Identities, errors, limits and configuration shared across the crate
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

pub use config::RegistryConfig;
pub use errors::{CallError, CallResult, ConfigError, DenialReason, ParseIdError, SnapshotError};
pub use types::{ClientId, OperationId};
