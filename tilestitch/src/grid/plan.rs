//! Tile grid planning.

use super::{GeoBounds, GridError, RegionRequest, DEFAULT_MAX_PIXELS};
use crate::coord::{
    fixed_tile_to_geo, geo_to_fixed_tile, project_to_mercator_meters, validate_zoom, FixedCoord,
    FIXED_PRECISION_BITS, SUBTILE_BITS,
};

/// Sub-tile steps per tile edge.
const SUBTILE_STEPS: u64 = 1 << SUBTILE_BITS;

/// Immutable layout of one stitch operation.
///
/// Tile indices are inclusive at both ends. The first tile's top-left corner
/// sits at `(-origin_offset_x, -origin_offset_y)` in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGridPlan {
    pub zoom: u8,
    pub tile_size: u32,
    pub tx1: u32,
    pub ty1: u32,
    pub tx2: u32,
    pub ty2: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub origin_offset_x: u32,
    pub origin_offset_y: u32,
    /// Geographic bounds the canvas was derived from.
    pub bounds: GeoBounds,
    pub projected_min_x: f64,
    pub projected_min_y: f64,
    pub projected_max_x: f64,
    pub projected_max_y: f64,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
}

impl TileGridPlan {
    /// Number of tile columns in the grid.
    pub fn columns(&self) -> u32 {
        self.tx2 - self.tx1 + 1
    }

    /// Number of tile rows in the grid.
    pub fn rows(&self) -> u32 {
        self.ty2 - self.ty1 + 1
    }

    /// Number of tile index positions in the grid.
    pub fn tile_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Total number of canvas pixels.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.canvas_width) * u64::from(self.canvas_height)
    }

    /// Iterates tile positions in row-major order (rows outer, columns inner).
    pub fn tiles(&self) -> TilePositions {
        TilePositions {
            tx1: self.tx1,
            tx2: self.tx2,
            ty2: self.ty2,
            next: Some((self.tx1, self.ty1)),
            remaining: self.tile_count(),
        }
    }

    /// Canvas position of a tile's top-left pixel. May be negative at the grid edge.
    pub fn tile_origin(&self, tx: u32, ty: u32) -> (i64, i64) {
        let size = i64::from(self.tile_size);
        (
            i64::from(tx - self.tx1) * size - i64::from(self.origin_offset_x),
            i64::from(ty - self.ty1) * size - i64::from(self.origin_offset_y),
        )
    }
}

/// Iterator over the tile positions of a plan.
#[derive(Debug, Clone)]
pub struct TilePositions {
    tx1: u32,
    tx2: u32,
    ty2: u32,
    next: Option<(u32, u32)>,
    remaining: usize,
}

impl Iterator for TilePositions {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let (tx, ty) = self.next?;

        self.next = if tx < self.tx2 {
            Some((tx + 1, ty))
        } else if ty < self.ty2 {
            Some((self.tx1, ty + 1))
        } else {
            None
        };
        self.remaining -= 1;

        Some((tx, ty))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TilePositions {}

/// Resolves a region into a tile grid using the default pixel ceiling.
pub fn resolve_tile_range(
    request: &RegionRequest,
    zoom: u8,
    tile_size: u32,
) -> Result<TileGridPlan, GridError> {
    resolve_tile_range_with_limit(request, zoom, tile_size, DEFAULT_MAX_PIXELS)
}

/// Resolves a region into a tile grid.
///
/// # Arguments
///
/// * `request` - Bounding box or centered region
/// * `zoom` - Zoom level (0 to 20)
/// * `tile_size` - Edge length of the server's tiles in pixels
/// * `max_pixels` - Canvas ceiling; larger canvases are rejected, never clamped
///
/// # Returns
///
/// The grid plan, or an error if the region is invalid, outside the
/// projection's domain, degenerate at this zoom, or too large.
pub fn resolve_tile_range_with_limit(
    request: &RegionRequest,
    zoom: u8,
    tile_size: u32,
    max_pixels: u64,
) -> Result<TileGridPlan, GridError> {
    validate_zoom(zoom)?;
    if tile_size == 0 {
        return Err(GridError::InvalidTileSize(tile_size));
    }
    request.validate()?;

    let (nw, se, bounds) = corner_coords(request, zoom)?;

    let (tx1, ty1) = nw.tile_index(zoom);
    let (tx2, ty2) = se.tile_index(zoom);

    let (offset_x, offset_y) = nw.subtile_offset(zoom);
    let origin_offset_x = scale_subtile(u64::from(offset_x), tile_size) as u32;
    let origin_offset_y = scale_subtile(u64::from(offset_y), tile_size) as u32;

    let (px1, py1) = nw.subtile_position(zoom);
    let (px2, py2) = se.subtile_position(zoom);
    let width = scale_subtile(px2 - px1, tile_size);
    let height = scale_subtile(py2 - py1, tile_size);

    if width == 0 || height == 0 {
        return Err(GridError::InvalidRegion(format!(
            "region is smaller than one pixel at zoom {}",
            zoom
        )));
    }

    // Saturating: a canvas big enough to overflow is far past any ceiling
    if width.saturating_mul(height) > max_pixels {
        return Err(GridError::OutputTooLarge {
            width,
            height,
            max_pixels,
        });
    }

    let too_large = || GridError::OutputTooLarge {
        width,
        height,
        max_pixels,
    };
    let canvas_width = u32::try_from(width).map_err(|_| too_large())?;
    let canvas_height = u32::try_from(height).map_err(|_| too_large())?;

    let (projected_min_x, projected_min_y) =
        project_to_mercator_meters(bounds.min_lat, bounds.min_lon);
    let (projected_max_x, projected_max_y) =
        project_to_mercator_meters(bounds.max_lat, bounds.max_lon);

    let pixel_size_x = (projected_max_x - projected_min_x) / width as f64;
    let pixel_size_y = (projected_max_y - projected_min_y).abs() / height as f64;

    Ok(TileGridPlan {
        zoom,
        tile_size,
        tx1,
        ty1,
        tx2,
        ty2,
        canvas_width,
        canvas_height,
        origin_offset_x,
        origin_offset_y,
        bounds,
        projected_min_x,
        projected_min_y,
        projected_max_x,
        projected_max_y,
        pixel_size_x,
        pixel_size_y,
    })
}

/// Converts 1/256th-tile steps to pixels at the given tile size.
#[inline]
fn scale_subtile(steps: u64, tile_size: u32) -> u64 {
    steps * u64::from(tile_size) / SUBTILE_STEPS
}

/// Computes the NW and SE corners in fixed-point tile space.
fn corner_coords(
    request: &RegionRequest,
    zoom: u8,
) -> Result<(FixedCoord, FixedCoord, GeoBounds), GridError> {
    match *request {
        RegionRequest::BoundingBox {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        } => {
            let nw = geo_to_fixed_tile(max_lat, min_lon, FIXED_PRECISION_BITS)?;
            let se = geo_to_fixed_tile(min_lat, max_lon, FIXED_PRECISION_BITS)?;
            let bounds = GeoBounds {
                min_lat,
                min_lon,
                max_lat,
                max_lon,
            };
            Ok((nw, se, bounds))
        }
        RegionRequest::Centered {
            lat,
            lon,
            width_px,
            height_px,
        } => {
            let center = geo_to_fixed_tile(lat, lon, FIXED_PRECISION_BITS)?;

            // One pixel at 256 px/tile spans 2^(32 - (zoom + 8)) fixed-point units
            let shift = u32::from(FIXED_PRECISION_BITS - (zoom + SUBTILE_BITS));
            let half_width = ((u64::from(width_px) << shift) / 2) as i64;
            let half_height = ((u64::from(height_px) << shift) / 2) as i64;

            let nw = offset_fixed(center, -half_width, -half_height)?;
            let se = offset_fixed(center, half_width, half_height)?;

            let (max_lat, min_lon) = fixed_tile_to_geo(nw, FIXED_PRECISION_BITS);
            let (min_lat, max_lon) = fixed_tile_to_geo(se, FIXED_PRECISION_BITS);
            let bounds = GeoBounds {
                min_lat,
                min_lon,
                max_lat,
                max_lon,
            };
            Ok((nw, se, bounds))
        }
    }
}

/// Offsets a fixed-point coordinate, rejecting results outside the world.
fn offset_fixed(coord: FixedCoord, dx: i64, dy: i64) -> Result<FixedCoord, GridError> {
    let x = i64::from(coord.x) + dx;
    let y = i64::from(coord.y) + dy;

    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) => Ok(FixedCoord::new(x, y)),
        _ => Err(GridError::InvalidRegion(
            "centered region extends beyond the edge of the world".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::CoordError;

    const Z10_TILE_SHIFT: u32 = 22;
    const Z10_SUBTILE_SHIFT: u32 = 14;

    /// Builds a fixed-point coordinate at zoom 10 from tile index and sub-tile step,
    /// nudged half a step inward so a float round-trip stays in the same step.
    fn z10(tile: u32, step: u32) -> u32 {
        (tile << Z10_TILE_SHIFT) + (step << Z10_SUBTILE_SHIFT) + (1 << (Z10_SUBTILE_SHIFT - 1))
    }

    fn bbox_from_fixed(nw: FixedCoord, se: FixedCoord) -> RegionRequest {
        let (max_lat, min_lon) = fixed_tile_to_geo(nw, 32);
        let (min_lat, max_lon) = fixed_tile_to_geo(se, 32);
        RegionRequest::bbox(min_lat, min_lon, max_lat, max_lon)
    }

    #[test]
    fn test_two_by_two_grid_at_zoom_10() {
        let nw = FixedCoord::new(z10(500, 64), z10(300, 64));
        let se = FixedCoord::new(z10(501, 192), z10(301, 192));
        let region = bbox_from_fixed(nw, se);

        let plan = resolve_tile_range(&region, 10, 256).unwrap();

        assert_eq!((plan.tx1, plan.ty1, plan.tx2, plan.ty2), (500, 300, 501, 301));
        assert_eq!(plan.tile_count(), 4);
        assert_eq!(plan.origin_offset_x, 64);
        assert_eq!(plan.origin_offset_y, 64);
        // 2 tiles minus the leading offset minus the trailing remainder
        assert_eq!(plan.canvas_width, 2 * 256 - 64 - 64);
        assert_eq!(plan.canvas_height, 2 * 256 - 64 - 64);
    }

    #[test]
    fn test_tile_size_scales_offsets_and_canvas() {
        let nw = FixedCoord::new(z10(500, 64), z10(300, 128));
        let se = FixedCoord::new(z10(501, 192), z10(301, 0));
        let region = bbox_from_fixed(nw, se);

        let plan = resolve_tile_range(&region, 10, 512).unwrap();

        assert_eq!(plan.origin_offset_x, 128);
        assert_eq!(plan.origin_offset_y, 256);
        assert_eq!(plan.canvas_width, (256 + 192 - 64) * 2);
        assert_eq!(plan.canvas_height, (256 - 128) * 2);
    }

    #[test]
    fn test_tile_origins() {
        let nw = FixedCoord::new(z10(500, 64), z10(300, 32));
        let se = FixedCoord::new(z10(501, 192), z10(301, 192));
        let plan = resolve_tile_range(&bbox_from_fixed(nw, se), 10, 256).unwrap();

        assert_eq!(plan.tile_origin(500, 300), (-64, -32));
        assert_eq!(plan.tile_origin(501, 300), (192, -32));
        assert_eq!(plan.tile_origin(501, 301), (192, 224));
    }

    #[test]
    fn test_tiles_iterate_row_major() {
        let nw = FixedCoord::new(z10(10, 8), z10(20, 8));
        let se = FixedCoord::new(z10(12, 8), z10(21, 8));
        let plan = resolve_tile_range(&bbox_from_fixed(nw, se), 10, 256).unwrap();

        let tiles: Vec<_> = plan.tiles().collect();
        assert_eq!(
            tiles,
            vec![(10, 20), (11, 20), (12, 20), (10, 21), (11, 21), (12, 21)]
        );
        assert_eq!(plan.tiles().len(), 6);
    }

    #[test]
    fn test_bay_area_bbox() {
        let region = RegionRequest::bbox(37.371794, -122.917099, 38.226853, -121.564407);
        let plan = resolve_tile_range(&region, 10, 256).unwrap();

        assert!(plan.tx1 <= plan.tx2);
        assert!(plan.ty1 <= plan.ty2);
        assert!(plan.canvas_width > 0 && plan.canvas_height > 0);
        assert!(plan.pixel_size_x > 0.0);
        assert!(plan.pixel_size_y > 0.0);
        assert!(plan.projected_min_x < plan.projected_max_x);
        assert!(plan.projected_min_y < plan.projected_max_y);
        // Zoom 10 pixels are ~150 m at the equator
        assert!(plan.pixel_size_x > 100.0 && plan.pixel_size_x < 200.0);
    }

    #[test]
    fn test_centered_canvas_matches_requested_size() {
        let region = RegionRequest::centered(35.6824, 139.7531, 640, 480);
        let plan = resolve_tile_range(&region, 10, 256).unwrap();

        assert!((plan.canvas_width as i64 - 640).abs() <= 1);
        assert!((plan.canvas_height as i64 - 480).abs() <= 1);
        assert!(plan.bounds.min_lat < 35.6824 && plan.bounds.max_lat > 35.6824);
        assert!(plan.bounds.min_lon < 139.7531 && plan.bounds.max_lon > 139.7531);
    }

    #[test]
    fn test_centered_past_world_edge_rejected() {
        let region = RegionRequest::centered(0.0, -179.99, 4000, 100);
        let err = resolve_tile_range(&region, 2, 256).unwrap_err();
        assert!(matches!(err, GridError::InvalidRegion(_)));
    }

    #[test]
    fn test_output_too_large_rejected() {
        let region = RegionRequest::bbox(-60.0, -170.0, 60.0, 170.0);
        let err = resolve_tile_range(&region, 12, 256).unwrap_err();
        assert!(matches!(err, GridError::OutputTooLarge { .. }));
    }

    #[test]
    fn test_custom_pixel_limit() {
        let nw = FixedCoord::new(z10(500, 64), z10(300, 64));
        let se = FixedCoord::new(z10(501, 192), z10(301, 192));
        let region = bbox_from_fixed(nw, se);

        let err = resolve_tile_range_with_limit(&region, 10, 256, 1000).unwrap_err();
        assert_eq!(
            err,
            GridError::OutputTooLarge {
                width: 384,
                height: 384,
                max_pixels: 1000
            }
        );
    }

    #[test]
    fn test_canvas_wider_than_u32_rejected_without_limit() {
        let region = RegionRequest::bbox(-80.0, -179.0, 80.0, 179.0);
        let err = resolve_tile_range_with_limit(&region, 20, 8192, u64::MAX).unwrap_err();

        match err {
            GridError::OutputTooLarge { width, height, .. } => {
                assert!(width > u64::from(u32::MAX));
                assert!(height > u64::from(u32::MAX));
            }
            other => panic!("expected OutputTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_latitude_outside_mercator_domain() {
        let region = RegionRequest::bbox(80.0, 0.0, 88.0, 1.0);
        let err = resolve_tile_range(&region, 5, 256).unwrap_err();
        assert!(matches!(
            err,
            GridError::Projection(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_invalid_zoom() {
        let region = RegionRequest::bbox(37.0, -122.0, 38.0, -121.0);
        let err = resolve_tile_range(&region, 21, 256).unwrap_err();
        assert_eq!(err, GridError::Projection(CoordError::InvalidZoom(21)));
    }

    #[test]
    fn test_zero_tile_size() {
        let region = RegionRequest::bbox(37.0, -122.0, 38.0, -121.0);
        let err = resolve_tile_range(&region, 10, 0).unwrap_err();
        assert_eq!(err, GridError::InvalidTileSize(0));
    }

    #[test]
    fn test_degenerate_region_rejected() {
        let region = RegionRequest::bbox(37.0, -122.0, 37.000001, -121.999999);
        let err = resolve_tile_range(&region, 2, 256).unwrap_err();
        assert!(matches!(err, GridError::InvalidRegion(_)));
    }

    #[test]
    fn test_invalid_region_rejected_before_projection() {
        let region = RegionRequest::bbox(38.0, -122.0, 38.0, -121.0);
        let err = resolve_tile_range(&region, 10, 256).unwrap_err();
        assert!(matches!(err, GridError::InvalidRegion(_)));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_resolution_is_deterministic(
                lat in -60.0..60.0_f64,
                lon in -170.0..170.0_f64,
                dlat in 0.01..1.0_f64,
                dlon in 0.01..1.0_f64,
                zoom in 4u8..=12
            ) {
                let region = RegionRequest::bbox(lat, lon, lat + dlat, lon + dlon);
                let first = resolve_tile_range(&region, zoom, 256);
                let second = resolve_tile_range(&region, zoom, 256);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn test_canvas_fits_inside_tile_grid(
                lat in -60.0..60.0_f64,
                lon in -170.0..170.0_f64,
                dlat in 0.01..1.0_f64,
                dlon in 0.01..1.0_f64,
                zoom in 4u8..=12
            ) {
                let region = RegionRequest::bbox(lat, lon, lat + dlat, lon + dlon);
                if let Ok(plan) = resolve_tile_range(&region, zoom, 256) {
                    prop_assert!(plan.origin_offset_x < 256);
                    prop_assert!(plan.origin_offset_y < 256);
                    prop_assert!(
                        plan.origin_offset_x + plan.canvas_width <= plan.columns() * 256
                    );
                    prop_assert!(
                        plan.origin_offset_y + plan.canvas_height <= plan.rows() * 256
                    );
                }
            }
        }
    }
}
