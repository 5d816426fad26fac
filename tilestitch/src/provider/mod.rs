//! Tile server access
//!
//! Builds tile URLs from templates, retrieves them over HTTP and decodes
//! the responses into RGBA tiles. Per-tile problems are reported as
//! [`TileOutcome::Failed`] values, never as errors.
//!
//! # Example
//!
//! ```ignore
//! use tilestitch::provider::{AsyncReqwestClient, FetchConfig, TileFetcher, UrlTemplate};
//!
//! let client = AsyncReqwestClient::new(&FetchConfig::default())?;
//! let templates = vec![UrlTemplate::parse("https://tile.example.com/{z}/{x}/{y}.png")?];
//! let fetcher = TileFetcher::new(&client, &templates, &[], 10, 256);
//! let fetch = fetcher.fetch(163, 395).await;
//! ```

mod decode;
mod fetch;
mod http;
mod template;
mod types;

pub use decode::{decode_tile, sniff_format};
pub use fetch::{TileFetch, TileFetcher};
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use template::{TemplateError, UrlTemplate};
pub use types::{
    DecodedTile, FetchConfig, FetchFailure, ProviderError, TileFormat, TileOutcome,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;

#[cfg(test)]
pub(crate) use decode::tests::{jpeg_tile, png_tile};
