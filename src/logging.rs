//! Diagnostics go to stderr so stdout stays clean for JSON output.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CHESS_META_LOG";

/// Install the global subscriber. `CHESS_META_LOG` wins over `verbose`;
/// calling this more than once is harmless.
pub fn init(verbose: bool) {
    let fallback = if verbose {
        "warn,chess_meta=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
