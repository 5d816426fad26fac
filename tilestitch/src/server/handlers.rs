//! Route handlers.

use super::api::{
    ErrorResponse, FailedTileBody, HealthResponse, StitchRequest, TileErrorResponse,
    ValidationErrorResponse, ValidationIssue, ERROR_INTERNAL, ERROR_INVALID_JSON,
    ERROR_TILE_SERVER, ERROR_TILE_SERVER_TIMEOUT, ERROR_VALIDATION,
};
use super::validate::validate_request;
use super::AppState;
use crate::provider::AsyncHttpClient;
use crate::stitch::{StitchError, StitchResult};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_TILES_TOTAL: &str = "x-tiles-total";
pub const HEADER_TILES_FAILED: &str = "x-tiles-failed";
pub const HEADER_STITCH_WARNING: &str = "x-stitch-warning";
pub const HEADER_WORLD_FILE: &str = "x-world-file";

/// `GET /api/v1/health`
pub async fn health<C: AsyncHttpClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uptime: state.started.elapsed().as_secs(),
        version: state.version.clone(),
    })
}

/// `GET /health`, kept for older clients.
pub async fn legacy_health() -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/api/v1/health")],
    )
        .into_response()
}

/// `OPTIONS` preflight.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// `POST /api/v1/stitch`
pub async fn stitch<C: AsyncHttpClient + 'static>(
    State(state): State<Arc<AppState<C>>>,
    body: Bytes,
) -> Response {
    let request_id = new_request_id();

    let request: StitchRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            debug!(request_id = %request_id, error = %e, "Rejected malformed JSON");
            return error_response(
                StatusCode::BAD_REQUEST,
                ERROR_INVALID_JSON,
                "Invalid JSON in request body".to_string(),
                &request_id,
                None,
            );
        }
    };

    let validated = match validate_request(&request, &state.base_options()) {
        Ok(v) => v,
        Err(issues) => {
            debug!(request_id = %request_id, issues = issues.len(), "Rejected invalid request");
            return validation_response(issues, &request_id);
        }
    };

    info!(
        request_id = %request_id,
        mode = validated.region.mode_name(),
        zoom = validated.options.zoom,
        "Stitch request accepted"
    );

    let cancel = state.shutdown.child_token();
    match state
        .stitcher
        .stitch(&validated.region, &validated.options, &cancel)
        .await
    {
        Ok(result) => image_response(result, &request_id),
        Err(e) => stitch_error_response(e, &request_id, state.request_timeout.as_secs()),
    }
}

/// Generates an identifier of the form `req_<nanoseconds>`.
pub fn new_request_id() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("req_{}", nanos)
}

fn image_response(result: StitchResult, request_id: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(result.format.content_type()),
    );
    set_header(&mut headers, HEADER_REQUEST_ID, request_id);
    set_header(
        &mut headers,
        HEADER_TILES_TOTAL,
        &result.ledger.total_tiles().to_string(),
    );
    set_header(
        &mut headers,
        HEADER_TILES_FAILED,
        &result.ledger.failed_count().to_string(),
    );
    if let Some(notice) = result.notices.first() {
        set_header(&mut headers, HEADER_STITCH_WARNING, &notice.to_string());
    }
    if let Some(world_file) = &result.world_file {
        let params = world_file
            .parameters()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        set_header(&mut headers, HEADER_WORLD_FILE, &params);
    }

    (StatusCode::OK, headers, Body::from(result.image_bytes)).into_response()
}

fn stitch_error_response(err: StitchError, request_id: &str, timeout_secs: u64) -> Response {
    match err {
        StitchError::TileFetchExhausted { reason, ledger } => {
            warn!(request_id = %request_id, %reason, "Stitch failed on tile fetches");
            let body = TileErrorResponse {
                error: ERROR_TILE_SERVER.to_string(),
                message: format!("Failed to fetch tiles: {}", reason),
                failed_tiles: ledger
                    .failed_tiles()
                    .iter()
                    .map(|t| FailedTileBody {
                        url: t.failure.url.clone(),
                        status_code: t.failure.http_status,
                        error: t.failure.reason.clone(),
                    })
                    .collect(),
                successful_tiles: ledger.successful_tiles(),
                total_tiles: ledger.total_tiles(),
                request_id: Some(request_id.to_string()),
            };
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
        StitchError::Cancelled(reason) => {
            warn!(request_id = %request_id, %reason, "Stitch timed out");
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                ERROR_TILE_SERVER_TIMEOUT,
                "Tile server requests timed out".to_string(),
                request_id,
                Some(serde_json::json!({ "timeout_seconds": timeout_secs })),
            )
        }
        other => {
            error!(request_id = %request_id, error = %other, "Stitch failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ERROR_INTERNAL,
                other.to_string(),
                request_id,
                None,
            )
        }
    }
}

fn validation_response(issues: Vec<ValidationIssue>, request_id: &str) -> Response {
    let message = issues
        .first()
        .map(|i| i.message.clone())
        .unwrap_or_else(|| "Request validation failed".to_string());
    let body = ValidationErrorResponse {
        error: ERROR_VALIDATION.to_string(),
        message,
        request_id: Some(request_id.to_string()),
        validation_errors: issues,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn error_response(
    status: StatusCode,
    code: &str,
    message: String,
    request_id: &str,
    details: Option<serde_json::Value>,
) -> Response {
    let body = ErrorResponse {
        error: code.to_string(),
        message,
        request_id: Some(request_id.to_string()),
        details,
    };
    (status, Json(body)).into_response()
}

/// Inserts a header, dropping values that are not valid header text.
fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(HeaderName::from_static(name), v);
        }
        Err(_) => debug!(header = name, "Dropped invalid header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{png_tile, MockAsyncHttpClient, ProviderError};
    use crate::stitch::{StitchLimits, Stitcher};
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    const URL: &str = "http://tiles.test/{z}/{x}/{y}.png";

    fn state(client: MockAsyncHttpClient) -> Arc<AppState<MockAsyncHttpClient>> {
        Arc::new(AppState {
            stitcher: Stitcher::new(client),
            started: Instant::now(),
            version: "2.0.0".to_string(),
            request_timeout: Duration::from_secs(30),
            tile_size: 8,
            limits: StitchLimits::default(),
            shutdown: CancellationToken::new(),
        })
    }

    fn body(json: serde_json::Value) -> Bytes {
        Bytes::from(serde_json::to_vec(&json).unwrap())
    }

    fn bbox_body() -> Bytes {
        body(serde_json::json!({
            "mode": "bbox",
            "bbox": {"min_lat": 37.37, "min_lon": -122.92, "max_lat": 38.23, "max_lon": -121.56},
            "zoom": 10,
            "tile_source": {"url": URL}
        }))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health(State(state(MockAsyncHttpClient::new()))).await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.version, "2.0.0");
        assert!(chrono::DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_legacy_health_redirects() {
        let response = legacy_health().await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/v1/health"
        );
    }

    #[tokio::test]
    async fn test_stitch_success() {
        let client = MockAsyncHttpClient::always(Ok(png_tile(8, [0, 128, 0, 255])));
        let response = stitch(State(state(client)), bbox_body()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert!(headers
            .get(HEADER_REQUEST_ID)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("req_"));
        assert_eq!(headers.get(HEADER_TILES_FAILED).unwrap(), "0");
        assert!(headers.get(HEADER_WORLD_FILE).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_stitch_geotiff_warning_and_world_file() {
        let client = MockAsyncHttpClient::always(Ok(png_tile(8, [0, 128, 0, 255])));
        let request = body(serde_json::json!({
            "mode": "centered",
            "center": {"lat": 35.68, "lon": 139.75, "width": 512, "height": 512},
            "zoom": 12,
            "tile_source": {"url": URL},
            "output": {"format": "geotiff", "generate_worldfile": true}
        }));
        let response = stitch(State(state(client)), request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert!(headers.get(HEADER_STITCH_WARNING).is_some());
        let world = headers.get(HEADER_WORLD_FILE).unwrap().to_str().unwrap();
        assert_eq!(world.split(',').count(), 6);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let response = stitch(
            State(state(MockAsyncHttpClient::new())),
            Bytes::from_static(b"{not json"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "INVALID_JSON");
        assert_eq!(body.message, "Invalid JSON in request body");
        assert!(body.request_id.is_some());
    }

    #[tokio::test]
    async fn test_validation_error() {
        let client = MockAsyncHttpClient::new();
        let state = state(client);
        let request = body(serde_json::json!({
            "mode": "bbox",
            "bbox": {"min_lat": 38.0, "min_lon": -122.0, "max_lat": 37.0, "max_lon": -121.0},
            "zoom": 10,
            "tile_source": {"url": URL}
        }));
        let response = stitch(State(state.clone()), request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ValidationErrorResponse = read_json(response).await;
        assert_eq!(body.error, "VALIDATION_ERROR");
        assert_eq!(body.message, "min_lat must be less than max_lat");
        assert_eq!(body.validation_errors.len(), 1);
        assert!(state.stitcher.client().requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_tile_exhaustion_is_bad_gateway() {
        let client = MockAsyncHttpClient::always(Err(ProviderError::HttpStatus {
            status: 503,
            url: "http://tiles.test".to_string(),
        }));
        let response = stitch(State(state(client)), bbox_body()).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: TileErrorResponse = read_json(response).await;
        assert_eq!(body.error, "TILE_SERVER_ERROR");
        assert_eq!(body.successful_tiles, 0);
        assert_eq!(body.failed_tiles.len(), body.total_tiles);
        assert_eq!(body.failed_tiles[0].status_code, Some(503));
    }

    #[tokio::test]
    async fn test_shutdown_is_gateway_timeout() {
        let client = MockAsyncHttpClient::always(Ok(png_tile(8, [0, 0, 0, 255])));
        let state = state(client);
        state.shutdown.cancel();

        let response = stitch(State(state), bbox_body()).await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "TILE_SERVER_TIMEOUT");
        assert_eq!(body.details.unwrap()["timeout_seconds"], 30);
    }

    #[tokio::test]
    async fn test_too_large_is_internal_error() {
        let client = MockAsyncHttpClient::always(Ok(png_tile(8, [0, 0, 0, 255])));
        let state = Arc::new(AppState {
            limits: StitchLimits {
                max_pixels: 10,
                ..StitchLimits::default()
            },
            ..Arc::try_unwrap(state(client)).ok().unwrap()
        });

        let response = stitch(State(state), bbox_body()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = read_json(response).await;
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert!(body.message.contains("too large"));
    }

    #[test]
    fn test_request_id_format() {
        let id = new_request_id();
        assert!(id.starts_with("req_"));
        assert!(id[4..].chars().all(|c| c.is_ascii_digit()));
    }
}
