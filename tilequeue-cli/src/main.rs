//! tilequeue CLI - Command-line interface
//!
//! Runs render benchmarks against the tilequeue library and manages its
//! configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use commands::bench::BenchArgs;
use commands::config::ConfigCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tilequeue")]
#[command(version = tilequeue::VERSION)]
#[command(about = "Concurrent map tile render queue", long_about = None)]
struct Cli {
    /// Enable debug logging (also echoes logs to stdout)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a synthetic viewport and print queue statistics
    Bench(BenchArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(cli.debug)?;

    match cli.command {
        Commands::Bench(args) => commands::bench::run(args, &runner),
        Commands::Config(command) => {
            runner.log_startup("config");
            commands::config::run(command, runner.config())
        }
    }
}
