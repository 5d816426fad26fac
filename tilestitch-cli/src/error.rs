//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tilestitch::config::ConfigFileError;
use tilestitch::server::ServerError;
use tilestitch::stitch::StitchError;

/// Failed tiles listed before the remainder is summarized.
const MAX_LISTED_FAILURES: usize = 10;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Invalid or inconsistent command-line arguments
    InvalidArgs(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Stitch failed
    Stitch(StitchError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// HTTP API server error
    Serve(ServerError),
}

impl CliError {
    /// Process exit code: 2 for tile exhaustion, 3 for cancellation or
    /// deadline, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Stitch(StitchError::TileFetchExhausted { .. }) => 2,
            CliError::Stitch(StitchError::Cancelled(_)) => 3,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Stitch(StitchError::TileFetchExhausted { ledger, .. }) => {
                eprintln!();
                eprintln!(
                    "{} of {} tiles succeeded. Failed tiles:",
                    ledger.successful_tiles(),
                    ledger.total_tiles()
                );
                for tile in ledger.failed_tiles().iter().take(MAX_LISTED_FAILURES) {
                    eprintln!("  {}/{}: {}", tile.x, tile.y, tile.failure);
                }
                let remaining = ledger.failed_count().saturating_sub(MAX_LISTED_FAILURES);
                if remaining > 0 {
                    eprintln!("  ... and {} more", remaining);
                }
                eprintln!();
                eprintln!("Check that the URL template is correct and the tile server is reachable.");
            }
            CliError::Serve(ServerError::Bind { .. }) => {
                eprintln!();
                eprintln!("Is another process already listening on that address?");
                eprintln!("Use --bind and --port to choose a different one.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgs(msg) => write!(f, "{}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Stitch(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Serve(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Stitch(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<StitchError> for CliError {
    fn from(e: StitchError) -> Self {
        CliError::Stitch(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Serve(e)
    }
}
