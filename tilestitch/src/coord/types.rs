//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the stitcher
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 20;

/// Bits of precision used for tile-space coordinates (one world = 2^32 units).
pub const FIXED_PRECISION_BITS: u8 = 32;

/// Bits of sub-tile resolution used for pixel alignment (256 steps per tile).
pub const SUBTILE_BITS: u8 = 8;

/// Half the Earth's circumference in EPSG:3857 meters (`2 * pi * 6378137 / 2`).
pub const ORIGIN_SHIFT: f64 = 20037508.342789244;

/// A point in Web Mercator tile space, quantized to `2^32` units per world width.
///
/// The top `zoom` bits of each axis are the tile index at that zoom; the
/// next 8 bits are the position inside the tile at 1/256th-tile resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedCoord {
    /// X coordinate (east-west), 0 at the antimeridian
    pub x: u32,
    /// Y coordinate (north-south), 0 at the north edge
    pub y: u32,
}

impl FixedCoord {
    /// Creates a new fixed-point coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the slippy-map tile index `(x, y)` containing this point.
    #[inline]
    pub fn tile_index(&self, zoom: u8) -> (u32, u32) {
        let shift = u32::from(FIXED_PRECISION_BITS - zoom);
        (
            (u64::from(self.x) >> shift) as u32,
            (u64::from(self.y) >> shift) as u32,
        )
    }

    /// Returns the global pixel position at 256 pixels per tile.
    #[inline]
    pub fn subtile_position(&self, zoom: u8) -> (u64, u64) {
        let shift = u32::from(FIXED_PRECISION_BITS - (zoom + SUBTILE_BITS));
        (u64::from(self.x) >> shift, u64::from(self.y) >> shift)
    }

    /// Returns the offset inside the containing tile, in 1/256th-tile steps.
    #[inline]
    pub fn subtile_offset(&self, zoom: u8) -> (u32, u32) {
        let (x, y) = self.subtile_position(zoom);
        ((x & 0xFF) as u32, (y & 0xFF) as u32)
    }
}

/// Errors that can occur during coordinate conversion
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside the Web Mercator domain (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 20)
    InvalidZoom(u8),
    /// Precision does not fit a 32-bit fixed-point coordinate
    InvalidPrecision(u8),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidPrecision(bits) => {
                write!(
                    f,
                    "Invalid precision: {} bits (must be at most {})",
                    bits, FIXED_PRECISION_BITS
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
