//! Tile image decoding.

use super::types::{DecodedTile, ProviderError, TileFormat};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_SIGNATURE: [u8; 2] = [0xFF, 0xD8];

/// Detects the tile format from its magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<TileFormat> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        Some(TileFormat::Png)
    } else if bytes.starts_with(&JPEG_SIGNATURE) {
        Some(TileFormat::Jpeg)
    } else {
        None
    }
}

/// Decodes a PNG or JPEG tile into RGBA8 and checks its dimensions.
///
/// JPEG pixels come out fully opaque. Tiles whose size differs from
/// `tile_size` are rejected, not resized. The size comes from the image
/// header, so a mismatched tile is never decoded.
pub fn decode_tile(bytes: &[u8], tile_size: u32) -> Result<DecodedTile, ProviderError> {
    let format = sniff_format(bytes).ok_or_else(|| {
        ProviderError::InvalidResponse("unsupported image format (expected PNG or JPEG)".into())
    })?;

    let image_format = match format {
        TileFormat::Png => ImageFormat::Png,
        TileFormat::Jpeg => ImageFormat::Jpeg,
    };

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), image_format)
        .into_dimensions()
        .map_err(|e| ProviderError::InvalidResponse(format!("failed to read tile header: {}", e)))?;

    if width != tile_size || height != tile_size {
        return Err(ProviderError::TileSizeMismatch {
            width,
            height,
            expected: tile_size,
        });
    }

    let pixels = ImageReader::with_format(Cursor::new(bytes), image_format)
        .decode()
        .map_err(|e| ProviderError::InvalidResponse(format!("failed to decode tile: {}", e)))?
        .to_rgba8();

    Ok(DecodedTile {
        pixels,
        format,
        channel_depth: format.channel_depth(),
    })
}
