//! Common types and utilities shared across CLI commands.

use clap::{Args, ValueEnum};
use tilestitch::grid::RegionRequest;
use tilestitch::output::OutputFormat;

use crate::error::CliError;

/// Output format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatArg {
    /// Lossless PNG
    Png,
    /// GeoTIFF (not implemented, written as PNG with a warning)
    Geotiff,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Geotiff => OutputFormat::GeoTiff,
        }
    }
}

/// Region selection flags.
///
/// Exactly one of three forms: `--bbox`, the four `--min-*`/`--max-*`
/// flags, or the centered `--lat --lon --width --height`.
#[derive(Debug, Clone, Default, Args)]
pub struct RegionArgs {
    /// Bounding box as min_lat,min_lon,max_lat,max_lon
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["min_lat", "min_lon", "max_lat", "max_lon", "lat", "lon", "width", "height"])]
    pub bbox: Option<String>,

    /// Southern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub min_lat: Option<f64>,

    /// Western edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub min_lon: Option<f64>,

    /// Northern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub max_lat: Option<f64>,

    /// Eastern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub max_lon: Option<f64>,

    /// Center latitude in degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["min_lat", "min_lon", "max_lat", "max_lon"])]
    pub lat: Option<f64>,

    /// Center longitude in degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["min_lat", "min_lon", "max_lat", "max_lon"])]
    pub lon: Option<f64>,

    /// Output width in pixels (centered mode)
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels (centered mode)
    #[arg(long)]
    pub height: Option<u32>,
}

impl RegionArgs {
    /// Turns the flags into a region request.
    pub fn resolve(&self) -> Result<RegionRequest, CliError> {
        if let Some(bbox) = &self.bbox {
            let [min_lat, min_lon, max_lat, max_lon] = parse_bbox(bbox)?;
            return Ok(RegionRequest::bbox(min_lat, min_lon, max_lat, max_lon));
        }

        let corners = [self.min_lat, self.min_lon, self.max_lat, self.max_lon];
        let centered_given = self.lat.is_some()
            || self.lon.is_some()
            || self.width.is_some()
            || self.height.is_some();

        if corners.iter().any(Option::is_some) {
            return match corners {
                [Some(min_lat), Some(min_lon), Some(max_lat), Some(max_lon)] => {
                    Ok(RegionRequest::bbox(min_lat, min_lon, max_lat, max_lon))
                }
                _ => Err(CliError::InvalidArgs(
                    "--min-lat, --min-lon, --max-lat and --max-lon must be given together"
                        .to_string(),
                )),
            };
        }

        if centered_given {
            return match (self.lat, self.lon, self.width, self.height) {
                (Some(lat), Some(lon), Some(width), Some(height)) => {
                    Ok(RegionRequest::centered(lat, lon, width, height))
                }
                _ => Err(CliError::InvalidArgs(
                    "--lat, --lon, --width and --height must be given together".to_string(),
                )),
            };
        }

        Err(CliError::InvalidArgs(
            "no region given: use --bbox, --min-lat/--min-lon/--max-lat/--max-lon, \
             or --lat/--lon/--width/--height"
                .to_string(),
        ))
    }
}

/// Parses `min_lat,min_lon,max_lat,max_lon`.
pub fn parse_bbox(value: &str) -> Result<[f64; 4], CliError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(CliError::InvalidArgs(format!(
            "--bbox expects min_lat,min_lon,max_lat,max_lon, got '{}'",
            value
        )));
    }

    let mut out = [0.0; 4];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| {
            CliError::InvalidArgs(format!("--bbox value '{}' is not a number", part))
        })?;
    }
    Ok(out)
}

/// Parses `Name: Value` into a header pair.
pub fn parse_header(value: &str) -> Result<(String, String), CliError> {
    match value.split_once(':') {
        Some((name, val)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(CliError::InvalidArgs(format!(
            "--header expects NAME:VALUE, got '{}'",
            value
        ))),
    }
}
