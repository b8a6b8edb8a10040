//! Default values for settings that only exist in the configuration file.
//!
//! Tunables owned by a component (`RouteCacheConfig`, `SnapConfig`, ...)
//! keep their defaults next to that component.

use std::path::PathBuf;

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER_TYPE: &str = "straight";

/// Public OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// HTTP timeout for routing requests, in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 15;

/// Log file name.
pub const DEFAULT_LOG_FILE: &str = "trackline.log";

/// Provider types accepted in `[provider] type`.
pub const VALID_PROVIDER_TYPES: [&str; 3] = ["osrm", "google", "straight"];

/// Highest accepted `[route] key_precision`.
pub const MAX_KEY_PRECISION: u32 = 8;

/// Get the path to the config directory (~/.trackline).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trackline")
}

/// Get the path to the config file (~/.trackline/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Default log directory (~/.trackline/logs).
pub fn default_log_directory() -> PathBuf {
    config_directory().join("logs")
}
