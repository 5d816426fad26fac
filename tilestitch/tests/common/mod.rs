//! Shared fixtures for integration tests.
//!
//! Runs a small tile server on a loopback port that serves solid-color PNG
//! tiles and records what it was asked for.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::net::TcpListener;

/// Side length of tiles served by [`TileServer`].
pub const TEST_TILE_SIZE: u32 = 16;

/// Color of every tile the server returns.
pub const TILE_COLOR: [u8; 4] = [30, 120, 200, 255];

/// A tile request as seen by the server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub user_agent: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Default)]
struct ServerState {
    missing: HashSet<(u32, u32)>,
    fail_all: bool,
    seen: Mutex<Vec<SeenRequest>>,
}

/// Loopback tile server.
pub struct TileServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
}

impl TileServer {
    /// Serves every tile.
    pub async fn start() -> Self {
        Self::start_with(ServerState::default()).await
    }

    /// Answers 404 for the given `(x, y)` positions.
    pub async fn with_missing(missing: &[(u32, u32)]) -> Self {
        Self::start_with(ServerState {
            missing: missing.iter().copied().collect(),
            ..ServerState::default()
        })
        .await
    }

    /// Answers 503 for everything.
    pub async fn failing() -> Self {
        Self::start_with(ServerState {
            fail_all: true,
            ..ServerState::default()
        })
        .await
    }

    async fn start_with(state: ServerState) -> Self {
        let state = Arc::new(state);
        let app = Router::new()
            .route("/tiles/:z/:x/:y", get(serve_tile))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// URL template pointing at this server.
    pub fn template(&self) -> String {
        format!("http://{}/tiles/{{z}}/{{x}}/{{y}}", self.addr)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }
}

async fn serve_tile(
    State(state): State<Arc<ServerState>>,
    Path((z, x, y)): Path<(u8, u32, u32)>,
    headers: HeaderMap,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().unwrap().push(SeenRequest {
        z,
        x,
        y,
        user_agent: header("user-agent"),
        api_key: header("x-api-key"),
    });

    if state.fail_all {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if state.missing.contains(&(x, y)) {
        return StatusCode::NOT_FOUND.into_response();
    }

    (
        [(axum::http::header::CONTENT_TYPE, "image/png")],
        png_bytes(TEST_TILE_SIZE, TILE_COLOR),
    )
        .into_response()
}

/// Encodes a solid-color PNG.
pub fn png_bytes(size: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(size, size, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A loopback address nothing listens on.
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
