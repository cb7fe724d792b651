/*!
 * Tracing Setup
 * Structured logging for grants and guarded calls using the tracing crate
 *
 * Features:
 * - `RUST_LOG` driven filtering
 * - JSON-formatted logs for structured parsing
 * - One span per guarded call carrying client and selector
 */

use crate::core::limits::ENV_TRACE_JSON;
use crate::core::types::{ClientId, OperationId};
use tracing::{debug_span, info, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - CALL_ORDER_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Span wrapping one guarded call
pub fn call_span(client: ClientId, operation: OperationId) -> Span {
    debug_span!("guarded_call", client = %client, operation = %operation)
}
