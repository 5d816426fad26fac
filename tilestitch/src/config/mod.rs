//! Configuration file support.
//!
//! Reads `~/.tilestitch/config.ini`. Every value is optional; missing keys
//! keep their defaults and command-line flags override both.
//!
//! ```ini
//! [http]
//! timeout = 30
//! user_agent = tile-stitch/2.0.0
//!
//! [limits]
//! max_failure_ratio = 0.5
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_BIND, DEFAULT_SERVER_PORT, MIN_HTTP_TIMEOUT_SECS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, HttpSettings, LimitsSettings, OutputSettings, ServerSettings};
