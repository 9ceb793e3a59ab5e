//! Tracing initialization for processes embedding the ledger.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: JSON lines, filtered via `RUST_LOG`
/// (default level `info`).
///
/// Calling this more than once is harmless; only the first call wins.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
