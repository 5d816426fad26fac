//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization, configuration loading and the async
//! runtime so command handlers stay small.

use crate::error::CliError;
use std::future::Future;
use std::path::{Path, PathBuf};
use tilestitch::config::{config_file_path, ConfigFile};
use tilestitch::logging::{init_logging, LoggingGuard, LoggingOptions};
use tokio::runtime::Runtime;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Initialize logging, then load the config file (or defaults).
    ///
    /// Logging comes first so config warnings are visible.
    pub fn new(logging: &LoggingOptions, config_path: Option<&Path>) -> Result<Self, CliError> {
        let logging_guard =
            init_logging(logging).map_err(|e| CliError::LoggingInit(e.to_string()))?;
        let config = load_config(config_path)?;
        let runtime = Runtime::new().map_err(CliError::Runtime)?;

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(version = tilestitch::VERSION, command, "tilestitch starting");
    }

    /// Run a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Write bytes to a file.
    pub fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), CliError> {
        std::fs::write(path, data).map_err(|e| CliError::FileWrite {
            path: path.display().to_string(),
            error: e,
        })?;
        info!(path = %path.display(), bytes = data.len(), "Wrote file");
        Ok(())
    }
}

/// The config file in use: `--config` when given, else the default path.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Load configuration from `--config` or the default location.
///
/// A missing default file yields defaults; a missing `--config` file is an error.
pub fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            info!(path = %path.display(), "Using config file");
            Ok(ConfigFile::load_from(path)?)
        }
        None => Ok(ConfigFile::load()?),
    }
}
