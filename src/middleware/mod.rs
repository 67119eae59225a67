//! Middleware layer.
//!
//! Cross-cutting concerns that wrap every request:
//! - `middleware::cors`: preflight answers and allow headers
//! - `middleware::trace`: per-request span with method, path, status, latency

pub mod cors;
pub(crate) mod trace;
