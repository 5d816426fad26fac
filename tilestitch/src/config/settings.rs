//! Configuration settings structs.

use crate::output::OutputFormat;
use crate::provider::FetchConfig;
use crate::stitch::StitchLimits;
use std::time::Duration;

/// Contents of `~/.tilestitch/config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub http: HttpSettings,
    pub output: OutputSettings,
    pub limits: LimitsSettings,
    pub server: ServerSettings,
}

/// `[http]` section: tile requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Per-tile request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
}

/// `[output]` section: defaults for stitched images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub tile_size: u32,
    pub format: OutputFormat,
    pub worldfile: bool,
}

/// `[limits]` section: stitch policy.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitsSettings {
    pub max_pixels: u64,
    pub max_failure_ratio: f64,
    /// Whole-stitch deadline in seconds, `None` for unbounded
    pub deadline: Option<u64>,
}

/// `[server]` section: HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    /// Per-request stitch deadline in seconds
    pub request_timeout: u64,
}

impl ConfigFile {
    /// HTTP client settings for tile fetching.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.http.timeout),
            user_agent: self.http.user_agent.clone(),
        }
    }

    pub fn stitch_limits(&self) -> StitchLimits {
        StitchLimits {
            max_pixels: self.limits.max_pixels,
            max_failure_ratio: self.limits.max_failure_ratio,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.limits.deadline.map(Duration::from_secs)
    }
}
