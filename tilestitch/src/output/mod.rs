//! Output encoding
//!
//! Serializes the finished canvas to PNG and produces the optional world
//! file sidecar. GeoTIFF is accepted as a requested format but is encoded
//! as PNG; see [`OutputFormat::encoded_as`].

mod worldfile;

pub use worldfile::{
    encode_world_file, world_file_path, WorldFile, WORLD_FILE_FIELD_WIDTH, WORLD_FILE_PRECISION,
};

use image::{ImageFormat, RgbaImage};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    GeoTiff,
}

impl OutputFormat {
    /// Format the bytes are actually encoded in.
    pub fn encoded_as(self) -> OutputFormat {
        OutputFormat::Png
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::GeoTiff => "geotiff",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::GeoTiff => "image/tiff",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognised format names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormatError(pub String);

impl fmt::Display for UnknownFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown output format '{}' (expected png or geotiff)", self.0)
    }
}

impl std::error::Error for UnknownFormatError {}

impl FromStr for OutputFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "geotiff" | "tiff" | "tif" => Ok(OutputFormat::GeoTiff),
            _ => Err(UnknownFormatError(s.to_string())),
        }
    }
}

/// Encodes the canvas as a lossless PNG.
pub fn encode_canvas(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
