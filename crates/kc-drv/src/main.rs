//! kc-drv - A command-line driver for the K semantic analyser.
//!
//! This is the main entry point for the kc-drv CLI. It uses clap for
//! argument parsing and dispatches to the appropriate command handler.

mod commands;
mod config;
mod error;
mod fixture;
mod resolver;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    check::{run_check, CheckArgs},
    init::{run_init, InitArgs},
};
use config::Config;
use error::{DrvError, Result};

/// kc-drv - a driver for the K semantic analyser
///
/// kc-drv scaffolds new projects and runs fixture expressions through
/// `kc-sem`'s analyser for demonstration and integration testing.
#[derive(Parser, Debug)]
#[command(name = "kc-drv")]
#[command(author = "K Language Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A CLI driver for the K semantic analyser", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "KC_VERBOSE")]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "KC_CONFIG")]
    config: Option<PathBuf>,

    /// Disable color output
    #[arg(long, global = true, env = "KC_NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the kc-drv CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Scaffold a new kc project
    ///
    /// Creates a fixtures directory and a default configuration file in the
    /// specified or current directory.
    Init(InitCommand),

    /// Analyse a fixture expression
    ///
    /// Reads a fixture file, builds the ParseExpr tree it describes, and
    /// runs it through the semantic analyser.
    Check(CheckCommand),
}

/// Arguments for the init subcommand.
#[derive(Parser, Debug)]
struct InitCommand {
    /// Directory to initialize (default: current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Force initialization even if directory is not empty
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the check subcommand.
#[derive(Parser, Debug)]
struct CheckCommand {
    /// Path to the fixture file to analyse
    fixture: PathBuf,
}

/// Main entry point for the kc-drv CLI.
fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color)?;
    let config = load_config(cli.config.as_deref())?;

    execute_command(cli.command, cli.verbose, config)
}

/// Initialize the logging system.
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("info") };

    let subscriber =
        fmt::layer().with_ansi(!no_color).with_target(false).with_thread_ids(false).with_thread_names(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| DrvError::Config(format!("failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

/// Execute the selected command.
fn execute_command(command: Commands, verbose: bool, config: Config) -> Result<()> {
    match command {
        Commands::Init(args) => execute_init(args, verbose),
        Commands::Check(args) => execute_check(args, verbose, config),
    }
}

fn execute_init(args: InitCommand, verbose: bool) -> Result<()> {
    run_init(InitArgs { verbose, force: args.force, path: args.path })
}

fn execute_check(args: CheckCommand, verbose: bool, config: Config) -> Result<()> {
    let verbose = verbose || config.verbose;
    run_check(CheckArgs { verbose, fixture: args.fixture })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["kc-drv", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_init_with_path() {
        let cli = Cli::parse_from(["kc-drv", "init", "--path", "/tmp/test"]);
        if let Commands::Init(args) = cli.command {
            assert_eq!(args.path, Some(PathBuf::from("/tmp/test")));
        } else {
            panic!("Expected Init command");
        }
    }

    #[test]
    fn test_cli_parse_init_with_force() {
        let cli = Cli::parse_from(["kc-drv", "init", "--force"]);
        if let Commands::Init(args) = cli.command {
            assert!(args.force);
        } else {
            panic!("Expected Init command");
        }
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::parse_from(["kc-drv", "check", "fixture.json"]);
        if let Commands::Check(args) = cli.command {
            assert_eq!(args.fixture, PathBuf::from("fixture.json"));
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_parse_global_verbose() {
        let cli = Cli::parse_from(["kc-drv", "--verbose", "init"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_global_config() {
        let cli = Cli::parse_from(["kc-drv", "--config", "/path/to/config.toml", "init"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_cli_parse_global_no_color() {
        let cli = Cli::parse_from(["kc-drv", "--no-color", "init"]);
        assert!(cli.no_color);
    }
}
