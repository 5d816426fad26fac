//! Region request types.

use super::GridError;

/// Geographic region to render.
///
/// Either two corners of a bounding box, or a center point plus the desired
/// output size in 256-pixel-tile pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionRequest {
    /// Bounding box in degrees. Requires `min_lat < max_lat` and `min_lon < max_lon`.
    BoundingBox {
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    },
    /// Center point in degrees plus output dimensions in pixels.
    Centered {
        lat: f64,
        lon: f64,
        width_px: u32,
        height_px: u32,
    },
}

impl RegionRequest {
    /// Creates a bounding box request.
    pub fn bbox(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        RegionRequest::BoundingBox {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Creates a centered request.
    pub fn centered(lat: f64, lon: f64, width_px: u32, height_px: u32) -> Self {
        RegionRequest::Centered {
            lat,
            lon,
            width_px,
            height_px,
        }
    }

    /// Checks the structural invariants of the request.
    ///
    /// Projection domain limits are not checked here; they surface as
    /// [`GridError::Projection`] during resolution.
    pub fn validate(&self) -> Result<(), GridError> {
        match *self {
            RegionRequest::BoundingBox {
                min_lat,
                min_lon,
                max_lat,
                max_lon,
            } => {
                if ![min_lat, min_lon, max_lat, max_lon]
                    .iter()
                    .all(|v| v.is_finite())
                {
                    return Err(GridError::InvalidRegion(
                        "bounding box coordinates must be finite numbers".to_string(),
                    ));
                }
                if min_lat >= max_lat {
                    return Err(GridError::InvalidRegion(
                        "min_lat must be less than max_lat".to_string(),
                    ));
                }
                if min_lon >= max_lon {
                    return Err(GridError::InvalidRegion(
                        "min_lon must be less than max_lon".to_string(),
                    ));
                }
            }
            RegionRequest::Centered {
                lat,
                lon,
                width_px,
                height_px,
            } => {
                if !lat.is_finite() || !lon.is_finite() {
                    return Err(GridError::InvalidRegion(
                        "center coordinates must be finite numbers".to_string(),
                    ));
                }
                if width_px == 0 || height_px == 0 {
                    return Err(GridError::InvalidRegion(
                        "width and height must be positive".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Returns a short label for the request mode.
    pub fn mode_name(&self) -> &'static str {
        match self {
            RegionRequest::BoundingBox { .. } => "bbox",
            RegionRequest::Centered { .. } => "centered",
        }
    }
}

/// Geographic bounds of the rendered region, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}
