//! Tracing subscriber setup for binaries and tests that want log output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (for example `"info"` or `"laddertrader=debug"`).
///
/// Returns `false` if a global subscriber was already set.
pub fn init_logging(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
