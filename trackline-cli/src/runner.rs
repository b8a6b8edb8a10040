//! CLI runner for common setup.
//!
//! Loads the configuration and initializes logging for commands that run
//! the tracking core.

use std::path::Path;

use tracing::info;
use trackline::config::ConfigFile;
use trackline::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Keeps logging active and holds the loaded configuration.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Loads the config (default path unless `config_path` is given) and
    /// starts logging to the configured file.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            provider = %config.provider.provider_type,
            log = %config.logging.directory.join(&config.logging.file).display(),
            "Trackline starting"
        );

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }
}
