//! Stitch options and policy limits.

use super::StitchError;
use crate::coord::MAX_ZOOM;
use crate::grid::{DEFAULT_MAX_PIXELS, DEFAULT_TILE_SIZE};
use crate::output::OutputFormat;
use crate::provider::UrlTemplate;
use std::time::Duration;

/// Default share of tile positions allowed to fail.
pub const DEFAULT_MAX_FAILURE_RATIO: f64 = 0.5;

/// Resource and failure policy for a stitch run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchLimits {
    /// Largest canvas accepted, in pixels
    pub max_pixels: u64,
    /// Runs with `failed > total * max_failure_ratio` are rejected
    pub max_failure_ratio: f64,
}

impl Default for StitchLimits {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            max_failure_ratio: DEFAULT_MAX_FAILURE_RATIO,
        }
    }
}

/// Everything a stitch needs besides the region.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchOptions {
    pub zoom: u8,
    pub tile_size: u32,
    /// Tried in order for each tile position
    pub url_templates: Vec<String>,
    /// Sent with every tile request, in order
    pub extra_headers: Vec<(String, String)>,
    pub output_format: OutputFormat,
    pub generate_world_file: bool,
    /// Upper bound on the whole run
    pub deadline: Option<Duration>,
    pub limits: StitchLimits,
}

impl StitchOptions {
    /// Creates options for a single URL template with defaults elsewhere.
    pub fn new(zoom: u8, url_template: impl Into<String>) -> Self {
        Self {
            zoom,
            tile_size: DEFAULT_TILE_SIZE,
            url_templates: vec![url_template.into()],
            extra_headers: Vec::new(),
            output_format: OutputFormat::Png,
            generate_world_file: false,
            deadline: None,
            limits: StitchLimits::default(),
        }
    }

    /// Appends a fallback template.
    pub fn with_fallback_template(mut self, template: impl Into<String>) -> Self {
        self.url_templates.push(template.into());
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_world_file(mut self, enabled: bool) -> Self {
        self.generate_world_file = enabled;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_limits(mut self, limits: StitchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates the options and parses the URL templates.
    pub fn validate(&self) -> Result<Vec<UrlTemplate>, StitchError> {
        if self.zoom > MAX_ZOOM {
            return Err(StitchError::InvalidOptions(format!(
                "zoom must be between 0 and {}, got {}",
                MAX_ZOOM, self.zoom
            )));
        }
        if self.tile_size == 0 {
            return Err(StitchError::InvalidOptions(
                "tile size must be positive".to_string(),
            ));
        }
        if self.url_templates.is_empty() {
            return Err(StitchError::InvalidOptions(
                "at least one URL template is required".to_string(),
            ));
        }
        if self.limits.max_pixels == 0 {
            return Err(StitchError::InvalidOptions(
                "max_pixels must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.limits.max_failure_ratio) {
            return Err(StitchError::InvalidOptions(format!(
                "max_failure_ratio must be between 0 and 1, got {}",
                self.limits.max_failure_ratio
            )));
        }

        self.url_templates
            .iter()
            .map(|t| UrlTemplate::parse(t.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StitchError::InvalidOptions(e.to_string()))
    }
}
