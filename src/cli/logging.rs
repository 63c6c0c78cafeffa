//! Diagnostic logging setup using the tracing crate.
//!
//! Logs go to stderr so they never mix with command output on stdout.
//! `RUST_LOG` takes precedence; otherwise only warnings are shown, or
//! debug output for this crate with `--verbose`.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose { "wave_recorder=debug,warn" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_names(verbose),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!("Logging initialized");
    }
}
