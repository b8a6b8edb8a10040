//! Trackline CLI - Command-line interface
//!
//! Resolves routes, replays recorded fix logs through a full tracking
//! session, and manages the configuration file.

mod commands;
mod console;
mod error;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use trackline::coord::Coordinate;
use trackline::phase::Phase;

use commands::common::PhaseAt;
use commands::config::ConfigCommands;
use commands::replay::ReplayOptions;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "trackline")]
#[command(version, about = "Route-constrained live courier tracking", long_about = None)]
struct Cli {
    /// Config file (default: ~/.trackline/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a route through the configured provider
    Route {
        /// Start point as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinate,

        /// End point as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinate,
    },

    /// Replay a JSON-lines fix log through a tracking session
    Replay {
        /// Fix log, one JSON position per line
        #[arg(long)]
        fixes: PathBuf,

        /// Pickup point as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        origin: Coordinate,

        /// Drop-off point as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        destination: Coordinate,

        /// Agent position when the journey was assigned, as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        journey_start: Option<Coordinate>,

        /// Phase at the start of the replay
        #[arg(long, default_value = "to-destination")]
        phase: Phase,

        /// Switch phase before fix N, as N:PHASE (repeatable)
        #[arg(long = "phase-at")]
        phase_at: Vec<PhaseAt>,

        /// Delay between fixes in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Session id used on the fix channel
        #[arg(long, default_value = "replay")]
        session: String,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { command } => commands::config::run(command, cli.config.as_deref()),

        Commands::Route { from, to } => {
            let runner = CliRunner::new(cli.config.as_deref())?;
            commands::route::run(&runner, from, to).await
        }

        Commands::Replay {
            fixes,
            origin,
            destination,
            journey_start,
            phase,
            phase_at,
            interval_ms,
            session,
        } => {
            let runner = CliRunner::new(cli.config.as_deref())?;
            let options = ReplayOptions {
                fixes,
                session_id: session,
                origin,
                destination,
                journey_start,
                phase,
                phase_at,
                interval: Duration::from_millis(interval_ms),
            };
            commands::replay::run(&runner, options).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay_arguments() {
        let cli = Cli::try_parse_from([
            "trackline",
            "replay",
            "--fixes",
            "fixes.jsonl",
            "--origin",
            "-33.86,151.20",
            "--destination",
            "-33.87,151.21",
            "--phase-at",
            "0:to-origin",
            "--phase-at",
            "5:at-origin",
            "--interval-ms",
            "250",
        ])
        .unwrap();

        match cli.command {
            Commands::Replay {
                origin,
                phase,
                phase_at,
                interval_ms,
                ..
            } => {
                assert_eq!(origin.latitude, -33.86);
                assert_eq!(phase, Phase::ToDestination);
                assert_eq!(phase_at.len(), 2);
                assert_eq!(phase_at[1].phase, Phase::AtOrigin);
                assert_eq!(interval_ms, 250);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_rejects_bad_coordinate() {
        assert!(Cli::try_parse_from(["trackline", "route", "--from", "north", "--to", "1,2"]).is_err());
    }
}
