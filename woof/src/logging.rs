//! Diagnostic tracing for debugging woof itself.
//!
//! Tracing goes to stderr and is separate from the framed user output on
//! stdout. It is never persisted.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding an `EnvFilter` directive, e.g. `WOOF_LOG=woof=debug`.
pub const LOG_ENV: &str = "WOOF_LOG";

/// Install the global subscriber.
///
/// Uses `WOOF_LOG` when set; otherwise `info` for verbose runs (flag or
/// config) and `warn` for everything else. Output: stderr, compact format.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // A second init (tests) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "info" } else { "warn" }
}
