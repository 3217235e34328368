use std::env;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "REORG_LOG";

/// Install the global subscriber.
///
/// Logs go to stderr so prompts and reports on stdout stay clean. The filter
/// comes from `REORG_LOG` (default `info`); `verbose` forces `debug`.
pub fn init_logger(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string())
    };
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(filter_layer)
        .init();

    tracing::debug!(filter = %filter, "Tracing is configured for stderr");
}
