//! Configuration management CLI commands.

use clap::Subcommand;
use tilequeue::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration as INI
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::Show => {
            print!("{}", config.to_ini_string());
            Ok(())
        }
        ConfigCommands::Init { force } => run_init(force),
    }
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if path.exists() {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
    } else {
        ConfigFile::ensure_exists_at(&path)?;
        println!("Created {}", path.display());
    }
    Ok(())
}
