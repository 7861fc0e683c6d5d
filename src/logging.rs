//! Diagnostic logging.
//!
//! Logs go to stderr through a `tracing-subscriber` fmt layer so they never
//! mix with the dry-run report on stdout.  The filter is `warn` by default and
//! `debug` with `--verbose`; `RUST_LOG` overrides both.

use tracing_subscriber::{EnvFilter, fmt};

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Install the global subscriber.  Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // `try_init` fails only when a subscriber is already installed.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}
