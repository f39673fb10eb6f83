//! # Service Configuration
//!
//! Runtime configuration loaded from environment variables, with defaults
//! suited to a single-terminal canteen installation.
//!
//! ## Environment Variables
//! | Variable                       | Default            | Meaning                                |
//! |--------------------------------|--------------------|----------------------------------------|
//! | `MARACUYA_DB_PATH`             | `./maracuya.db`    | SQLite database file                   |
//! | `MARACUYA_STORAGE_TIMEOUT_MS`  | `5000`             | Timeout wrapped around the sale commit |
//! | `MARACUYA_MAX_PARKED_RETRIES`  | `5`                | Retry cap before manual resolution     |
//! | `MARACUYA_RETRY_BACKOFF_SECS`  | `30`               | Base of the exponential retry backoff  |
//! | `MARACUYA_AUTO_PRINT_KITCHEN`  | `true`             | Print kitchen tickets after commit     |
//! | `MARACUYA_LOG`                 | `info`             | Tracing filter directive               |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// How long a storage round trip may take before the commit is treated
    /// as a network failure and parked.
    pub storage_timeout: Duration,

    /// Automatic retries per parked sale before it waits for manual
    /// resolution on the recovery screen.
    pub max_parked_retries: u32,

    /// Base backoff; attempt `n` waits `base * 2^n`.
    pub retry_backoff: Duration,

    /// Whether kitchen tickets print automatically after a commit.
    pub auto_print_kitchen: bool,

    /// Tracing filter directive (e.g. `info`, `maracuya_pos=debug`).
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("./maracuya.db"),
            storage_timeout: Duration::from_millis(5000),
            max_parked_retries: 5,
            retry_backoff: Duration::from_secs(30),
            auto_print_kitchen: true,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        AppConfig {
            database_path: env::var("MARACUYA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            storage_timeout: env_u64("MARACUYA_STORAGE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.storage_timeout),
            max_parked_retries: env_u64("MARACUYA_MAX_PARKED_RETRIES")
                .map(|n| n as u32)
                .unwrap_or(defaults.max_parked_retries),
            retry_backoff: env_u64("MARACUYA_RETRY_BACKOFF_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_backoff),
            auto_print_kitchen: env_bool("MARACUYA_AUTO_PRINT_KITCHEN")
                .unwrap_or(defaults.auto_print_kitchen),
            log_filter: env::var("MARACUYA_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Backoff before retry attempt `attempt` (0-based), capped at one hour
    /// so an old parked sale does not schedule itself into next week.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let max = Duration::from_secs(3600);
        let scaled = self.retry_backoff.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        scaled.min(max)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|v| match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
