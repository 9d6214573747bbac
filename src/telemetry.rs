use tracing_subscriber::EnvFilter;

use crate::config::log_filter;

/// Installs the fmt subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_new(log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
