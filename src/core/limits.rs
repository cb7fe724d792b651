/*!
 * Limits and Constants
 *
 * Fixed widths of identities and default capacities of the audit trail.
 */

// =============================================================================
// IDENTIFIER WIDTHS
// =============================================================================

/// Account address width (20 bytes)
pub const CLIENT_ID_LEN: usize = 20;

/// Operation selector width (4 bytes)
/// Leading bytes of the Keccak-256 digest of the operation signature
pub const SELECTOR_LEN: usize = 4;

// =============================================================================
// AUDIT TRAIL
// =============================================================================

/// Global event ring buffer capacity
pub const MAX_REGISTRY_EVENTS: usize = 4096;

/// Per-client event ring buffer capacity
pub const MAX_CLIENT_EVENTS: usize = 256;

// =============================================================================
// ENVIRONMENT OVERRIDES
// =============================================================================

pub const ENV_MAX_EVENTS: &str = "CALL_ORDER_MAX_EVENTS";
pub const ENV_MAX_CLIENT_EVENTS: &str = "CALL_ORDER_MAX_CLIENT_EVENTS";
pub const ENV_AUDIT_CONSUMPTION: &str = "CALL_ORDER_AUDIT_CONSUMPTION";
pub const ENV_TRACE_JSON: &str = "CALL_ORDER_TRACE_JSON";
