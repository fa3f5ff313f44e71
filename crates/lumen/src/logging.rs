//! Logging setup

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system.
///
/// Logs go to stderr so stdout stays free for command output; `RUST_LOG`
/// overrides the default `info` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
