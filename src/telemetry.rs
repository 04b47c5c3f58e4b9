//! Tracing initialization

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// Events go to stderr so stdout stays free for the CSV report. The filter
/// comes from `RUST_LOG` and defaults to `info`. Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
