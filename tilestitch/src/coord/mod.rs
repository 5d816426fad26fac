//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! 32-bit fixed-point Web Mercator tile space, slippy-map tile indices and
//! EPSG:3857 planar meters used for georeferencing.

mod types;

pub use types::{
    CoordError, FixedCoord, FIXED_PRECISION_BITS, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM, ORIGIN_SHIFT, SUBTILE_BITS,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to fixed-point tile space.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `precision_bits` - Units per world width as a power of two (at most 32)
///
/// # Returns
///
/// A `Result` containing the quantized coordinate or an error if inputs are
/// outside the projection's domain. Values on the far east/south edge
/// saturate to `u32::MAX`.
#[inline]
pub fn geo_to_fixed_tile(lat: f64, lon: f64, precision_bits: u8) -> Result<FixedCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if precision_bits > FIXED_PRECISION_BITS {
        return Err(CoordError::InvalidPrecision(precision_bits));
    }

    let n = (1u64 << precision_bits) as f64;

    let x = n * ((lon + 180.0) / 360.0);

    // Web Mercator: ln(tan(lat) + sec(lat)) == asinh(tan(lat))
    let lat_rad = lat * PI / 180.0;
    let y = n * (1.0 - lat_rad.tan().asinh() / PI) / 2.0;

    Ok(FixedCoord::new(x as u32, y as u32))
}

/// Converts a fixed-point tile-space coordinate back to latitude/longitude.
///
/// Exact inverse of [`geo_to_fixed_tile`] up to quantization, via the
/// Gudermannian function.
#[inline]
pub fn fixed_tile_to_geo(coord: FixedCoord, precision_bits: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(i32::from(precision_bits));

    let lon = 360.0 * f64::from(coord.x) / n - 180.0;

    let lat_rad = (PI * (1.0 - 2.0 * f64::from(coord.y) / n)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Projects WGS84 latitude/longitude to spherical Mercator meters (EPSG:3857).
#[inline]
pub fn project_to_mercator_meters(lat: f64, lon: f64) -> (f64, f64) {
    let x = lon * ORIGIN_SHIFT / 180.0;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0);
    let y = y * ORIGIN_SHIFT / 180.0;

    (x, y)
}

/// Checks that a zoom level is within the supported range.
#[inline]
pub fn validate_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}
