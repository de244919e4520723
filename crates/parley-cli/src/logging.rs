//! Tracing setup shared by both binaries
//!
//! Logs go to stderr so they never interleave with the transcript on stdout.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` wins over the verbosity flag
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
