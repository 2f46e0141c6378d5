//! Tracing subscriber setup for the binary

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "DASHPACK_LOG";

/// Filter used when `DASHPACK_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "dashpack=info"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
