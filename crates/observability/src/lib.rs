//! `treasury-observability` — shared tracing/logging setup.

/// Initialize process-wide observability. Safe to call repeatedly;
/// subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filter, formatting).
pub mod tracing;
