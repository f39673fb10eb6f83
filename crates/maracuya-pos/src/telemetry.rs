//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `MARACUYA_LOG=debug` - Show debug messages
/// - `MARACUYA_LOG=maracuya=trace` - Show trace for maracuya crates only
/// - Default: INFO level, sqlx quieted to warnings
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("MARACUYA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_filter},sqlx=warn")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
