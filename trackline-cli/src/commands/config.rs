//! Configuration management CLI commands.
//!
//! Provides `config show`, `config init` and `config path`.

use std::path::Path;

use clap::Subcommand;
use trackline::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a config file with default values if none exists
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `path` (the default location if `None`).
pub fn run(command: ConfigCommands, path: Option<&Path>) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Init { force } => run_init(&path, force),
        ConfigCommands::Path => run_path(&path),
    }
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    if !path.exists() {
        println!("; {} does not exist, showing defaults", path.display());
        println!();
    }
    print!("{}", config.to_config_string());
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_defaults_once() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("trackline").join("config.ini");

        run(ConfigCommands::Init { force: false }, Some(&path)).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());

        // A second init leaves edits alone
        std::fs::write(&path, "[provider]\ntype = osrm\n").unwrap();
        run(ConfigCommands::Init { force: false }, Some(&path)).unwrap();
        assert_eq!(
            ConfigFile::load_from(&path).unwrap().provider.provider_type,
            "osrm"
        );

        run(ConfigCommands::Init { force: true }, Some(&path)).unwrap();
        assert_eq!(
            ConfigFile::load_from(&path).unwrap().provider.provider_type,
            "straight"
        );
    }

    #[test]
    fn test_show_rejects_invalid_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[snap]\nbacktrack_tolerance = lots\n").unwrap();

        assert!(matches!(
            run(ConfigCommands::Show, Some(&path)),
            Err(CliError::Config(_))
        ));
    }
}
