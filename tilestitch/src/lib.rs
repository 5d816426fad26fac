//! Tile Stitch - Web map tile stitching
//!
//! Fetches slippy-map tiles covering a geographic region, composites them
//! onto a single canvas cropped to the region and encodes the result as PNG,
//! optionally with a world file georeferencing it in Web Mercator.
//!
//! The library is organized bottom-up:
//!
//! - [`coord`]: Web Mercator projection and fixed-point tile coordinates
//! - [`grid`]: region requests and tile grid resolution
//! - [`provider`]: URL templates, HTTP fetch and tile decoding
//! - [`composite`]: canvas compositing and failure accounting
//! - [`output`]: PNG and world file encoding
//! - [`stitch`]: the orchestrating pipeline
//! - [`server`]: JSON HTTP API over the pipeline
//! - [`config`] and [`logging`]: ambient setup shared by the binaries

pub mod composite;
pub mod config;
pub mod coord;
pub mod grid;
pub mod logging;
pub mod output;
pub mod provider;
pub mod server;
pub mod stitch;

/// Crate version, reported by the health endpoint and `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
