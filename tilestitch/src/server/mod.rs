//! HTTP API
//!
//! Exposes the stitcher over JSON:
//!
//! | Route                 | Method | Purpose                           |
//! |-----------------------|--------|-----------------------------------|
//! | `/api/v1/stitch`      | POST   | Stitch a region, returns the PNG  |
//! | `/api/v1/health`      | GET    | Liveness, uptime and version      |
//! | `/health`             | GET    | 301 to `/api/v1/health`           |
//!
//! Every request runs under the configured request timeout and is cancelled
//! when the server shuts down.

pub mod api;
mod handlers;
mod validate;

pub use handlers::{
    new_request_id, HEADER_REQUEST_ID, HEADER_STITCH_WARNING, HEADER_TILES_FAILED,
    HEADER_TILES_TOTAL, HEADER_WORLD_FILE,
};
pub use validate::{validate_request, ValidatedStitch};

use crate::output::OutputFormat;
use crate::provider::{AsyncHttpClient, AsyncReqwestClient, FetchConfig};
use crate::stitch::{StitchError, StitchLimits, StitchOptions, Stitcher};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    #[error(transparent)]
    Stitch(#[from] StitchError),
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Deadline applied to every stitch
    pub request_timeout: Duration,
    /// Used when a request does not set `output.tile_size`
    pub tile_size: u32,
    pub limits: StitchLimits,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Shared state behind every route.
pub struct AppState<C: AsyncHttpClient> {
    pub stitcher: Stitcher<C>,
    pub started: Instant,
    pub version: String,
    pub request_timeout: Duration,
    pub tile_size: u32,
    pub limits: StitchLimits,
    /// Cancelled on shutdown; each request runs under a child token
    pub shutdown: CancellationToken,
}

impl<C: AsyncHttpClient> AppState<C> {
    pub fn new(stitcher: Stitcher<C>, config: &ServerConfig, shutdown: CancellationToken) -> Self {
        Self {
            stitcher,
            started: Instant::now(),
            version: crate::VERSION.to_string(),
            request_timeout: config.request_timeout,
            tile_size: config.tile_size,
            limits: config.limits,
            shutdown,
        }
    }

    /// Options a request starts from before its own fields are applied.
    pub fn base_options(&self) -> StitchOptions {
        StitchOptions {
            zoom: 0,
            tile_size: self.tile_size,
            url_templates: Vec::new(),
            extra_headers: Vec::new(),
            output_format: OutputFormat::Png,
            generate_world_file: false,
            deadline: Some(self.request_timeout),
            limits: self.limits,
        }
    }
}

/// Builds the API router.
pub fn router<C: AsyncHttpClient + 'static>(state: Arc<AppState<C>>) -> Router {
    Router::new()
        .route(
            "/api/v1/health",
            get(handlers::health::<C>).options(handlers::preflight),
        )
        .route("/health", get(handlers::legacy_health))
        .route(
            "/api/v1/stitch",
            post(handlers::stitch::<C>).options(handlers::preflight),
        )
        .layer(middleware::map_response(add_cors_headers))
        .with_state(state)
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, X-API-Key"),
    );
    response
}

/// Binds the configured address and serves until `shutdown` is cancelled
/// or a termination signal arrives.
pub async fn serve(
    config: ServerConfig,
    fetch: &FetchConfig,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let stitcher = Stitcher::<AsyncReqwestClient>::with_fetch_config(fetch)?;
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let state = Arc::new(AppState::new(stitcher, &config, shutdown.clone()));
    serve_listener(listener, state, shutdown).await
}

/// Serves on an already bound listener.
pub async fn serve_listener<C: AsyncHttpClient + 'static>(
    listener: TcpListener,
    state: Arc<AppState<C>>,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(local) = listener.local_addr() {
        info!(address = %local, version = %state.version, "Tile stitch server listening");
    }

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(ServerError::Serve)?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, SIGTERM or token cancellation, then cancels the token
/// so in-flight stitches stop.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = token.cancelled() => info!("Shutdown requested"),
    }

    token.cancel();
}
