//! Shared helpers for integration tests.

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once per test binary.
///
/// Honors `RUST_LOG`, e.g. `RUST_LOG=careers_e2e=debug`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("careers_e2e=info")),
        )
        .with_test_writer()
        .try_init();
}
