//! Tile Stitch CLI - Command-line interface
//!
//! This binary provides a command-line interface to the tilestitch library.

mod commands;
mod error;
mod progress;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilestitch::logging::LoggingOptions;

use commands::config::ConfigCommands;
use commands::serve::ServeArgs;
use commands::stitch::StitchArgs;

#[derive(Parser)]
#[command(name = "tilestitch")]
#[command(version = tilestitch::VERSION)]
#[command(about = "Stitch together and crop map tiles for any bounding box", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Config file [default: ~/.tilestitch/config.ini]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the tiles covering a region and stitch them into one PNG
    Stitch(StitchArgs),

    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let logging = LoggingOptions {
        verbose: cli.verbose,
        log_file: cli.log_file,
    };

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Stitch(args) => commands::stitch::run(args, &logging, config_path),
        Commands::Serve(args) => commands::serve::run(args, &logging, config_path),
        Commands::Config(command) => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
