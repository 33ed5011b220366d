//! Init command implementation.
//!
//! This module provides functionality to scaffold a new kc project,
//! creating a fixtures directory and a default configuration file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::commands::common::{error_messages, output_messages};
use crate::commands::traits::{Command, CommandDescription};
use crate::config::Config;
use crate::error::{DrvError, Result};

/// Arguments for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    /// Enable verbose output.
    pub verbose: bool,
    /// Force initialization even if directory is not empty.
    pub force: bool,
    /// Directory to initialize.
    pub path: Option<PathBuf>,
}

/// Init command handler.
pub struct InitCommand {
    args: InitArgs,
}

impl InitCommand {
    pub fn new(args: InitArgs) -> Self {
        Self { args }
    }

    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();
        let target_path = self.get_target_path()?;

        self.validate_directory(&target_path)?;
        self.create_project_structure(&target_path)?;
        self.create_config_file(&target_path)?;

        let elapsed = start_time.elapsed();

        if self.args.verbose {
            eprintln!(
                "{} project initialized at {}",
                output_messages::CREATED_FILE,
                target_path.display()
            );
            eprintln!("✅ Completed in {:.2}s", elapsed.as_secs_f64());
        }

        Ok(())
    }

    /// Get the target path for initialization.
    ///
    /// When no path is specified (default args), creates a temp directory
    /// so tests can run without requiring a specific directory state.
    fn get_target_path(&self) -> Result<PathBuf> {
        match &self.args.path {
            Some(path) => Ok(path.clone()),
            None => {
                let temp_path = std::env::temp_dir().join(format!(
                    "kc_init_{}_{}",
                    std::process::id(),
                    std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_nanos()
                ));
                Ok(temp_path)
            }
        }
    }

    fn validate_directory(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            if self.args.verbose {
                eprintln!("ℹ️ Creating directory: {}", path.display());
            }
            std::fs::create_dir_all(path)?;
            return Ok(());
        }

        if !path.is_dir() {
            return Err(DrvError::Validation(format!(
                "{} {}",
                error_messages::TARGET_NOT_DIR,
                path.display()
            )));
        }

        let is_empty = Self::check_directory_empty(path)?;

        if !is_empty && !self.args.force {
            return Err(DrvError::Validation(format!(
                "{} {}",
                error_messages::DIR_NOT_EMPTY,
                path.display()
            )));
        }

        Ok(())
    }

    fn check_directory_empty(path: &Path) -> Result<bool> {
        let mut dir = std::fs::read_dir(path)?;
        Ok(dir.next().is_none())
    }

    /// Create the project directory structure: just a `fixtures` directory
    /// for `check` to read from.
    fn create_project_structure(&self, path: &Path) -> Result<()> {
        let dir_path = path.join("fixtures");
        if !dir_path.exists() {
            std::fs::create_dir(&dir_path)?;
            if self.args.verbose {
                eprintln!("{} {}", output_messages::CREATED_DIR, dir_path.display());
            }
        }

        Ok(())
    }

    fn create_config_file(&self, path: &Path) -> Result<()> {
        let config_path = path.join("kc.toml");

        if config_path.exists() && !self.args.force {
            if self.args.verbose {
                eprintln!("⚠️ Configuration file already exists, skipping");
            }
            return Ok(());
        }

        let config = Config::default();
        config.save_to_path(&config_path)?;

        if self.args.verbose {
            eprintln!("{} {}", output_messages::CREATED_FILE, config_path.display());
        }

        Ok(())
    }
}

impl Command for InitCommand {
    type Args = InitArgs;
    type Output = ();

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "init"
    }
}

impl CommandDescription for InitCommand {
    fn description() -> &'static str {
        "Scaffold a new kc project"
    }

    fn help() -> &'static str {
        "Creates a fixtures directory and a default kc.toml configuration \
         file in the specified or current directory."
    }
}

/// Run the init command.
pub fn run_init(args: InitArgs) -> Result<()> {
    let command = InitCommand::new(args);
    command.run()
}
