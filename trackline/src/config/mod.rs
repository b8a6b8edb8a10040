//! Configuration.
//!
//! [`TrackingConfig`] groups the tunables of every component; each has
//! defaults next to the component it configures. [`ConfigFile`] adds
//! provider and logging settings and is read from `~/.trackline/config.ini`:
//!
//! ```ini
//! [provider]
//! type = osrm
//! base_url = https://router.project-osrm.org
//!
//! [route]
//! ttl_secs = 300
//! throttle_window_ms = 2000
//!
//! [session]
//! stale_fix_timeout_secs = 30
//! ```
//!
//! Durations are written with their unit in the key name (`_ms`, `_secs`).

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    config_directory, config_file_path, default_log_directory, DEFAULT_LOG_FILE,
    DEFAULT_OSRM_URL, DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_PROVIDER_TYPE, MAX_KEY_PRECISION,
    VALID_PROVIDER_TYPES,
};
pub use file::ConfigFileError;
pub use settings::{ConfigFile, LoggingSettings, ProviderSettings, TrackingConfig};
