//! Provider types

use image::RgbaImage;
use std::fmt;
use std::time::Duration;

/// Default User-Agent sent with tile requests.
pub const DEFAULT_USER_AGENT: &str = "tile-stitch/2.0.0";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while retrieving a single tile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport-level failure (connect, TLS, body read)
    HttpError(String),
    /// Request exceeded the configured timeout
    Timeout(String),
    /// Server answered with a non-2xx status
    HttpStatus { status: u16, url: String },
    /// Body is not a recognised or decodable image
    InvalidResponse(String),
    /// Decoded tile does not match the configured tile size
    TileSizeMismatch {
        width: u32,
        height: u32,
        expected: u32,
    },
}

impl ProviderError {
    /// Returns the HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            ProviderError::HttpStatus { status, url } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::TileSizeMismatch {
                width,
                height,
                expected,
            } => write!(
                f,
                "wrong tile size: got {}x{}, expected {}x{}",
                width, height, expected, expected
            ),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Settings for the tile HTTP client.
///
/// Passed explicitly to [`AsyncReqwestClient::new`](super::AsyncReqwestClient::new);
/// there is no process-wide client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Timeout for a single tile request
    pub timeout: Duration,
    /// User-Agent header, overridable per request via extra headers
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Image container detected from a tile's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    Png,
    Jpeg,
}

impl TileFormat {
    /// Channels carried by the encoded tile before RGBA expansion.
    pub fn channel_depth(self) -> u8 {
        match self {
            TileFormat::Png => 4,
            TileFormat::Jpeg => 3,
        }
    }
}

/// A tile decoded to RGBA8.
#[derive(Debug, Clone)]
pub struct DecodedTile {
    pub pixels: RgbaImage,
    pub format: TileFormat,
    /// 4 for PNG, 3 for JPEG (alpha forced opaque)
    pub channel_depth: u8,
}

impl DecodedTile {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Why one attempt at a tile failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: String,
    pub http_status: Option<u16>,
    pub reason: String,
}

impl FetchFailure {
    pub fn from_error(url: impl Into<String>, error: &ProviderError) -> Self {
        Self {
            url: url.into(),
            http_status: error.status(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.reason)
    }
}

/// Result of fetching one tile from one URL template.
#[derive(Debug, Clone)]
pub enum TileOutcome {
    Decoded(DecodedTile),
    Failed(FetchFailure),
}

impl TileOutcome {
    pub fn is_decoded(&self) -> bool {
        matches!(self, TileOutcome::Decoded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_http_status() {
        let err = ProviderError::HttpStatus {
            status: 404,
            url: "http://t/1/2/3.png".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(ProviderError::HttpError("reset".to_string()).status(), None);
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = ProviderError::TileSizeMismatch {
            width: 512,
            height: 512,
            expected: 256,
        };
        assert_eq!(
            err.to_string(),
            "wrong tile size: got 512x512, expected 256x256"
        );
    }

    #[test]
    fn test_failure_from_error_keeps_status() {
        let err = ProviderError::HttpStatus {
            status: 503,
            url: "http://t/a".to_string(),
        };
        let failure = FetchFailure::from_error("http://t/a", &err);
        assert_eq!(failure.http_status, Some(503));
        assert_eq!(failure.reason, "HTTP 503 from http://t/a");
    }

    #[test]
    fn test_default_fetch_config() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "tile-stitch/2.0.0");
    }
}
