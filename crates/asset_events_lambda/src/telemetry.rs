//! Tracing initialization for Lambda binaries.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a binary entrypoint.
///
/// Uses the `RUST_LOG` environment variable for filtering, defaulting to
/// `info` level.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
