//! Tile-grid resolution
//!
//! Turns a [`RegionRequest`] into a [`TileGridPlan`]: the inclusive range of
//! tile indices to fetch at a zoom level, the output canvas size, the
//! sub-tile alignment of the first tile and the georeferencing quantities
//! for the world file.
//!
//! ```text
//!   RegionRequest ──► fixed-point corners ──► tile range ──► TileGridPlan
//!   (bbox/centered)     (2^32 per world)      (>> 32-zoom)   (canvas, offsets,
//!                                                             pixel size)
//! ```

mod plan;
mod region;

pub use plan::{resolve_tile_range, resolve_tile_range_with_limit, TileGridPlan, TilePositions};
pub use region::{GeoBounds, RegionRequest};

use crate::coord::CoordError;
use thiserror::Error;

/// Default ceiling on the output canvas (10000 × 10000 pixels).
pub const DEFAULT_MAX_PIXELS: u64 = 10_000 * 10_000;

/// Default edge length of a tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Errors raised while resolving a region into a tile grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// The region parameters are malformed or contradictory.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// A coordinate falls outside the Web Mercator domain.
    #[error("Projection error: {0}")]
    Projection(#[from] CoordError),

    /// Tile size must be a positive number of pixels.
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(u32),

    /// The canvas would exceed the configured pixel ceiling.
    #[error("Requested image size too large: {width}x{height} (max {max_pixels} pixels)")]
    OutputTooLarge {
        width: u64,
        height: u64,
        max_pixels: u64,
    },
}
