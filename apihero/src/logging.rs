//! Logging init: compact stderr output filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Without `RUST_LOG`, only warnings are
/// shown, or index construction detail when `verbose` is set.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,apihero=debug,apihero_core=debug"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
