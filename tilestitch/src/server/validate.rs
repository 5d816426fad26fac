//! Request validation.
//!
//! Turns a loosely typed [`StitchRequest`] into a region and stitch options,
//! collecting every rejected field rather than stopping at the first.

use super::api::{StitchRequest, ValidationIssue};
use crate::coord::{MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};
use crate::grid::RegionRequest;
use crate::output::OutputFormat;
use crate::provider::UrlTemplate;
use crate::stitch::StitchOptions;

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStitch {
    pub region: RegionRequest,
    pub options: StitchOptions,
}

/// Validates a stitch request.
///
/// `base` supplies everything the request does not set: tile size, limits,
/// world file default and deadline. Its templates and headers are replaced.
pub fn validate_request(
    request: &StitchRequest,
    base: &StitchOptions,
) -> Result<ValidatedStitch, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let region = match request.mode.as_str() {
        "bbox" => bbox_region(request, &mut issues),
        "centered" => centered_region(request, &mut issues),
        "" => {
            issues.push(ValidationIssue::new("mode", "mode is required"));
            None
        }
        other => {
            issues.push(ValidationIssue::new(
                "mode",
                format!("invalid mode: {}", other),
            ));
            None
        }
    };

    let zoom = match u8::try_from(request.zoom) {
        Ok(z) if z <= MAX_ZOOM => Some(z),
        _ => {
            issues.push(ValidationIssue::new(
                "zoom",
                format!("zoom must be between 0 and {}", MAX_ZOOM),
            ));
            None
        }
    };

    let url = request.tile_source.url.trim();
    if url.is_empty() {
        issues.push(ValidationIssue::new(
            "tile_source.url",
            "tile_source.url is required",
        ));
    } else if UrlTemplate::parse(url).is_err() {
        issues.push(ValidationIssue::new(
            "tile_source.url",
            "tile_source.url must contain {z}, {x}, and {y} placeholders",
        ));
    }

    let mut output_format = base.output_format;
    let mut tile_size = base.tile_size;
    let mut generate_world_file = base.generate_world_file;
    if let Some(output) = &request.output {
        if let Some(format) = output.format.as_deref() {
            match format.parse::<OutputFormat>() {
                Ok(f) => output_format = f,
                Err(_) => issues.push(ValidationIssue::new(
                    "output.format",
                    format!("output.format must be 'png' or 'geotiff', got '{}'", format),
                )),
            }
        }
        if let Some(size) = output.tile_size {
            match u32::try_from(size) {
                Ok(s) if s > 0 => tile_size = s,
                _ => issues.push(ValidationIssue::new(
                    "output.tile_size",
                    "output.tile_size must be positive",
                )),
            }
        }
        if let Some(worldfile) = output.generate_worldfile {
            generate_world_file = worldfile;
        }
    }

    match (region, zoom) {
        (Some(region), Some(zoom)) if issues.is_empty() => {
            let extra_headers = request
                .tile_source
                .headers
                .iter()
                .flatten()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let options = StitchOptions {
                zoom,
                tile_size,
                url_templates: vec![url.to_string()],
                extra_headers,
                output_format,
                generate_world_file,
                ..base.clone()
            };
            Ok(ValidatedStitch { region, options })
        }
        _ => Err(issues),
    }
}

fn bbox_region(request: &StitchRequest, issues: &mut Vec<ValidationIssue>) -> Option<RegionRequest> {
    if request.center.is_some() {
        issues.push(ValidationIssue::new(
            "center",
            "center should not be provided when mode is 'bbox'",
        ));
    }
    let Some(bbox) = request.bbox else {
        issues.push(ValidationIssue::new(
            "bbox",
            "bbox is required when mode is 'bbox'",
        ));
        return None;
    };

    let before = issues.len();
    check_latitude("bbox.min_lat", bbox.min_lat, issues);
    check_latitude("bbox.max_lat", bbox.max_lat, issues);
    check_longitude("bbox.min_lon", bbox.min_lon, issues);
    check_longitude("bbox.max_lon", bbox.max_lon, issues);
    if bbox.min_lat >= bbox.max_lat {
        issues.push(ValidationIssue::new(
            "bbox",
            "min_lat must be less than max_lat",
        ));
    }
    if bbox.min_lon >= bbox.max_lon {
        issues.push(ValidationIssue::new(
            "bbox",
            "min_lon must be less than max_lon",
        ));
    }

    (issues.len() == before).then(|| {
        RegionRequest::bbox(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon)
    })
}

fn centered_region(
    request: &StitchRequest,
    issues: &mut Vec<ValidationIssue>,
) -> Option<RegionRequest> {
    if request.bbox.is_some() {
        issues.push(ValidationIssue::new(
            "bbox",
            "bbox should not be provided when mode is 'centered'",
        ));
    }
    let Some(center) = request.center else {
        issues.push(ValidationIssue::new(
            "center",
            "center is required when mode is 'centered'",
        ));
        return None;
    };

    let before = issues.len();
    check_latitude("center.lat", center.lat, issues);
    check_longitude("center.lon", center.lon, issues);
    let size = match (u32::try_from(center.width), u32::try_from(center.height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => {
            issues.push(ValidationIssue::new(
                "center",
                "width and height must be positive",
            ));
            None
        }
    };

    match size {
        Some((w, h)) if issues.len() == before => {
            Some(RegionRequest::centered(center.lat, center.lon, w, h))
        }
        _ => None,
    }
}

fn check_latitude(field: &str, value: f64, issues: &mut Vec<ValidationIssue>) {
    if !(MIN_LAT..=MAX_LAT).contains(&value) {
        issues.push(ValidationIssue::new(
            field,
            format!("{} must be between {} and {}", field, MIN_LAT, MAX_LAT),
        ));
    }
}

fn check_longitude(field: &str, value: f64, issues: &mut Vec<ValidationIssue>) {
    if !(MIN_LON..=MAX_LON).contains(&value) {
        issues.push(ValidationIssue::new(
            field,
            format!("{} must be between {} and {}", field, MIN_LON, MAX_LON),
        ));
    }
}
