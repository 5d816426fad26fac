//! World file (six-parameter affine georeferencing sidecar).

use std::path::{Path, PathBuf};

/// Width of each world file line, excluding the newline.
pub const WORLD_FILE_FIELD_WIDTH: usize = 24;

/// Fractional digits on each world file line.
pub const WORLD_FILE_PRECISION: usize = 10;

/// Affine transform from pixel to EPSG:3857 coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFile {
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    /// Projected X of the top-left pixel
    pub origin_x: f64,
    /// Projected Y of the top-left pixel
    pub origin_y: f64,
}

impl WorldFile {
    pub fn new(pixel_size_x: f64, pixel_size_y: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            pixel_size_x,
            pixel_size_y,
            origin_x,
            origin_y,
        }
    }

    /// The six parameters in file order: x-scale, y-skew, x-skew,
    /// negated y-scale, origin x, origin y.
    pub fn parameters(&self) -> [f64; 6] {
        [
            self.pixel_size_x,
            0.0,
            0.0,
            -self.pixel_size_y,
            self.origin_x,
            self.origin_y,
        ]
    }

    /// Serializes to six right-aligned, fixed-width lines.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.parameters()
            .iter()
            .map(|v| {
                format!(
                    "{:>width$.prec$}\n",
                    v,
                    width = WORLD_FILE_FIELD_WIDTH,
                    prec = WORLD_FILE_PRECISION
                )
            })
            .collect::<String>()
            .into_bytes()
    }
}

/// Produces world file bytes for the given transform.
pub fn encode_world_file(
    pixel_size_x: f64,
    pixel_size_y: f64,
    origin_x: f64,
    origin_y: f64,
) -> Vec<u8> {
    WorldFile::new(pixel_size_x, pixel_size_y, origin_x, origin_y).to_bytes()
}

/// Sidecar path for a PNG image: same stem, `.pnw` extension.
pub fn world_file_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("pnw")
}
