//! Stitch errors, notices and results.

use crate::composite::{ExhaustionReason, FailureLedger};
use crate::coord::CoordError;
use crate::grid::GridError;
use crate::output::{OutputFormat, WorldFile};
use bytes::Bytes;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a stitch stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired
    Cancelled,
    /// The run's deadline elapsed
    DeadlineExceeded { after: Duration },
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "stitch cancelled"),
            CancelReason::DeadlineExceeded { after } => {
                write!(f, "stitch deadline exceeded after {:.1}s", after.as_secs_f64())
            }
        }
    }
}

/// Errors that abort a stitch.
///
/// Per-tile failures never appear here directly; they accumulate in the
/// [`FailureLedger`] and only become [`StitchError::TileFetchExhausted`]
/// when the failure policy rejects the run.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Projection error: {0}")]
    Projection(#[from] CoordError),

    #[error("Requested image size too large: {width}x{height} (max {max_pixels} pixels)")]
    OutputTooLarge {
        width: u64,
        height: u64,
        max_pixels: u64,
    },

    #[error("Tile fetch failed: {reason}")]
    TileFetchExhausted {
        reason: ExhaustionReason,
        ledger: FailureLedger,
    },

    #[error("{0}")]
    Cancelled(CancelReason),

    #[error("Failed to encode output: {0}")]
    Encoding(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl From<GridError> for StitchError {
    fn from(e: GridError) -> Self {
        match e {
            GridError::InvalidRegion(msg) => StitchError::InvalidRegion(msg),
            GridError::Projection(e) => StitchError::Projection(e),
            GridError::InvalidTileSize(size) => {
                StitchError::InvalidOptions(format!("invalid tile size: {}", size))
            }
            GridError::OutputTooLarge {
                width,
                height,
                max_pixels,
            } => StitchError::OutputTooLarge {
                width,
                height,
                max_pixels,
            },
        }
    }
}

impl From<image::ImageError> for StitchError {
    fn from(e: image::ImageError) -> Self {
        StitchError::Encoding(e.to_string())
    }
}

/// Non-fatal conditions the caller should surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchNotice {
    /// The requested format is not implemented; `used` was written instead
    UnsupportedOutputFormat {
        requested: OutputFormat,
        used: OutputFormat,
    },
}

impl fmt::Display for StitchNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StitchNotice::UnsupportedOutputFormat { requested, used } => write!(
                f,
                "{} output is not supported, wrote {} instead",
                requested, used
            ),
        }
    }
}

/// A finished stitch.
#[derive(Debug, Clone)]
pub struct StitchResult {
    /// Encoded image, shared with response bodies without copying
    pub image_bytes: Bytes,
    /// Format of `image_bytes`
    pub format: OutputFormat,
    pub world_file: Option<WorldFile>,
    pub world_file_bytes: Option<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub projected_min_x: f64,
    pub projected_max_y: f64,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    /// Tile accounting; may list failures for a partial result
    pub ledger: FailureLedger,
    pub notices: Vec<StitchNotice>,
}

impl StitchResult {
    pub fn is_partial(&self) -> bool {
        self.ledger.failed_count() > 0
    }
}
