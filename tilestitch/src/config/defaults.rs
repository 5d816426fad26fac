//! Default values for configuration settings.

use super::settings::*;
use crate::grid::{DEFAULT_MAX_PIXELS, DEFAULT_TILE_SIZE};
use crate::output::OutputFormat;
use crate::provider::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::stitch::DEFAULT_MAX_FAILURE_RATIO;

/// Default address for `tilestitch serve`.
pub const DEFAULT_SERVER_BIND: &str = "localhost";

/// Default port for `tilestitch serve`.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default per-request stitch deadline for the HTTP API, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Smallest accepted tile request timeout, in seconds.
pub const MIN_HTTP_TIMEOUT_SECS: u64 = 1;

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            http: HttpSettings {
                timeout: DEFAULT_TIMEOUT_SECS,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            output: OutputSettings {
                tile_size: DEFAULT_TILE_SIZE,
                format: OutputFormat::Png,
                worldfile: false,
            },
            limits: LimitsSettings {
                max_pixels: DEFAULT_MAX_PIXELS,
                max_failure_ratio: DEFAULT_MAX_FAILURE_RATIO,
                deadline: None,
            },
            server: ServerSettings {
                bind: DEFAULT_SERVER_BIND.to_string(),
                port: DEFAULT_SERVER_PORT,
                request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
        }
    }
}

/// Raises a too-small tile request timeout and logs a warning if clamped.
pub(super) fn clamp_http_timeout(value: u64) -> u64 {
    if value < MIN_HTTP_TIMEOUT_SECS {
        tracing::warn!(
            requested = value,
            min = MIN_HTTP_TIMEOUT_SECS,
            "http timeout below minimum, clamping to {}",
            MIN_HTTP_TIMEOUT_SECS
        );
        return MIN_HTTP_TIMEOUT_SECS;
    }
    value
}
