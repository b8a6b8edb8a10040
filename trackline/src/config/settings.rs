//! Settings structs for the configuration file.
//!
//! Each struct maps to one or more `[section]`s of the INI file. These are
//! plain data; parsing lives in [`super::parser`], serialization in
//! [`super::writer`].

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use super::file::ConfigFileError;
use crate::animation::AnimationConfig;
use crate::provider::ProviderConfig;
use crate::route::RouteCacheConfig;
use crate::session::SessionConfig;
use crate::snap::SnapConfig;

/// All runtime tunables of the tracking core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingConfig {
    /// `[route]`
    pub route: RouteCacheConfig,
    /// `[snap]`
    pub snap: SnapConfig,
    /// `[animation]`
    pub animation: AnimationConfig,
    /// `[session]`
    pub session: SessionConfig,
}

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub tracking: TrackingConfig,
    pub provider: ProviderSettings,
    pub logging: LoggingSettings,
}

/// Routing provider configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Provider type: "osrm", "google" or "straight"
    pub provider_type: String,
    /// OSRM server base URL
    pub base_url: String,
    /// OSRM routing profile
    pub profile: String,
    /// Google Maps Platform API key (only required for "google")
    pub api_key: Option<String>,
    /// Google travel mode
    pub mode: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_type: DEFAULT_PROVIDER_TYPE.to_string(),
            base_url: DEFAULT_OSRM_URL.to_string(),
            profile: crate::provider::DEFAULT_OSRM_PROFILE.to_string(),
            api_key: None,
            mode: crate::provider::DEFAULT_TRAVEL_MODE.to_string(),
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl ProviderSettings {
    /// HTTP timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds the provider configuration these settings describe.
    ///
    /// # Errors
    ///
    /// `InvalidValue` when `type = google` has no API key.
    pub fn to_provider_config(&self) -> Result<ProviderConfig, ConfigFileError> {
        match self.provider_type.as_str() {
            "osrm" => Ok(ProviderConfig::Osrm {
                base_url: self.base_url.clone(),
                profile: self.profile.clone(),
            }),
            "google" => {
                let api_key = self.api_key.clone().ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "provider".to_string(),
                    key: "api_key".to_string(),
                    value: String::new(),
                    reason: "required when type = google".to_string(),
                })?;
                Ok(ProviderConfig::Google {
                    api_key,
                    mode: self.mode.clone(),
                })
            }
            "straight" => Ok(ProviderConfig::Straight),
            other => Err(ConfigFileError::InvalidValue {
                section: "provider".to_string(),
                key: "type".to_string(),
                value: other.to_string(),
                reason: format!("must be one of: {}", VALID_PROVIDER_TYPES.join(", ")),
            }),
        }
    }
}

/// Log output location.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
