//! JSON request and response bodies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ERROR_INVALID_JSON: &str = "INVALID_JSON";
pub const ERROR_VALIDATION: &str = "VALIDATION_ERROR";
pub const ERROR_TILE_SERVER: &str = "TILE_SERVER_ERROR";
pub const ERROR_TILE_SERVER_TIMEOUT: &str = "TILE_SERVER_TIMEOUT";
pub const ERROR_INTERNAL: &str = "INTERNAL_ERROR";

/// Body of `POST /api/v1/stitch`.
///
/// Fields are loosely typed so that out-of-range values produce validation
/// errors rather than JSON errors.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StitchRequest {
    /// `"bbox"` or `"centered"`
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub bbox: Option<BboxParams>,
    #[serde(default)]
    pub center: Option<CenterParams>,
    #[serde(default)]
    pub zoom: i64,
    #[serde(default)]
    pub tile_source: TileSource,
    #[serde(default)]
    pub output: Option<OutputParams>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BboxParams {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CenterParams {
    pub lat: f64,
    pub lon: f64,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TileSource {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputParams {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub tile_size: Option<i64>,
    #[serde(default)]
    pub generate_worldfile: Option<bool>,
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime: u64,
    pub version: String,
}

/// Generic error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Body of a 400 validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub validation_errors: Vec<ValidationIssue>,
}

/// A failed tile as reported to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTileBody {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub error: String,
}

/// Body of a 502 tile exhaustion failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileErrorResponse {
    pub error: String,
    pub message: String,
    pub failed_tiles: Vec<FailedTileBody>,
    pub successful_tiles: usize,
    pub total_tiles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}
