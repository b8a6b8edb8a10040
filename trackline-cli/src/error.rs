//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::process;

use thiserror::Error;
use trackline::config::ConfigFileError;
use trackline::provider::ProviderError;
use trackline::route::RouteError;
use trackline::session::ChannelError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to set up the routing provider
    #[error("Failed to create provider: {0}")]
    Provider(#[from] ProviderError),

    /// Route resolution failed
    #[error("Failed to resolve route: {0}")]
    Route(#[from] RouteError),

    /// Fix channel failure
    #[error("Fix channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Failed to read an input file
    #[error("Failed to read '{path}': {error}")]
    FileRead {
        path: String,
        #[source]
        error: std::io::Error,
    },

    /// A line of the fix log could not be parsed
    #[error("Invalid fix on line {line}: {reason}")]
    InvalidFix { line: usize, reason: String },

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Provider(_) | CliError::Route(RouteError::RouteUnavailable(_)) => {
                eprintln!();
                eprintln!("Check the [provider] section of your config:");
                eprintln!("  1. base_url points at a reachable OSRM server (type = osrm)");
                eprintln!("  2. api_key is set and the Directions API is enabled (type = google)");
                eprintln!("  3. Use type = straight to run without a routing backend");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'trackline config path' to locate the config file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}
