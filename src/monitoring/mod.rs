/*!
 * Monitoring Module
 * Tracing initialization and span helpers
 */

pub mod tracer;

pub use tracer::{call_span, init_tracing};
