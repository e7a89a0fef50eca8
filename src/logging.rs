//! Structured logging for the batch commands.
//!
//! Logs go to stderr so stdout stays clean for the run summary. The level is
//! taken from `RUST_LOG` (default `info`). The dashboard never installs a
//! subscriber: anything written to the terminal would corrupt the TUI.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
