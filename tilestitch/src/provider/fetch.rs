//! Tile fetching with ordered template fallback.

use super::decode::decode_tile;
use super::http::AsyncHttpClient;
use super::template::UrlTemplate;
use super::types::{FetchFailure, TileOutcome};
use tracing::{debug, warn};

/// Result of fetching one tile position across all templates.
#[derive(Debug, Clone)]
pub struct TileFetch {
    pub outcome: TileOutcome,
    /// Number of templates tried, including the successful one
    pub attempts: u32,
}

/// Fetches tiles for one stitch operation.
///
/// Borrows the client, templates and headers for the duration of the run.
/// Each template is tried at most once per tile; no retries.
pub struct TileFetcher<'a, C: AsyncHttpClient> {
    client: &'a C,
    templates: &'a [UrlTemplate],
    headers: Vec<(&'a str, &'a str)>,
    zoom: u8,
    tile_size: u32,
}

impl<'a, C: AsyncHttpClient> TileFetcher<'a, C> {
    pub fn new(
        client: &'a C,
        templates: &'a [UrlTemplate],
        headers: &'a [(String, String)],
        zoom: u8,
        tile_size: u32,
    ) -> Self {
        Self {
            client,
            templates,
            headers: headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect(),
            zoom,
            tile_size,
        }
    }

    /// Fetches and decodes a tile from a single template.
    ///
    /// Never fails past this boundary; errors become [`TileOutcome::Failed`].
    pub async fn fetch_tile(&self, template: &UrlTemplate, tx: u32, ty: u32) -> TileOutcome {
        let url = template.build(self.zoom, tx, ty);
        debug!(tx, ty, zoom = self.zoom, url = %url, "Fetching tile");

        let bytes = match self.client.get_with_headers(&url, &self.headers).await {
            Ok(bytes) => bytes,
            Err(e) => return TileOutcome::Failed(FetchFailure::from_error(url, &e)),
        };

        match decode_tile(&bytes, self.tile_size) {
            Ok(tile) => TileOutcome::Decoded(tile),
            Err(e) => TileOutcome::Failed(FetchFailure::from_error(url, &e)),
        }
    }

    /// Tries each template in order until one yields a decoded tile.
    ///
    /// On total failure the outcome carries the last template's failure.
    pub async fn fetch(&self, tx: u32, ty: u32) -> TileFetch {
        let mut attempts = 0;
        let mut last_failure = None;

        for template in self.templates {
            attempts += 1;
            match self.fetch_tile(template, tx, ty).await {
                TileOutcome::Decoded(tile) => {
                    return TileFetch {
                        outcome: TileOutcome::Decoded(tile),
                        attempts,
                    }
                }
                TileOutcome::Failed(failure) => {
                    warn!(
                        tx,
                        ty,
                        url = %failure.url,
                        status = ?failure.http_status,
                        reason = %failure.reason,
                        "Tile fetch failed"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        let failure = last_failure.unwrap_or_else(|| FetchFailure {
            url: String::new(),
            http_status: None,
            reason: "no URL templates configured".to_string(),
        });

        TileFetch {
            outcome: TileOutcome::Failed(failure),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::decode::tests::{jpeg_tile, png_tile};
    use crate::provider::{MockAsyncHttpClient, ProviderError, TileFormat};

    fn templates(raw: &[&str]) -> Vec<UrlTemplate> {
        raw.iter().map(|t| UrlTemplate::parse(*t).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_fetch_tile_decodes_png() {
        let mock = MockAsyncHttpClient::new()
            .with_response("http://a/3/1/2.png", Ok(png_tile(8, [1, 2, 3, 255])));
        let templates = templates(&["http://a/{z}/{x}/{y}.png"]);
        let fetcher = TileFetcher::new(&mock, &templates, &[], 3, 8);

        let outcome = fetcher.fetch_tile(&templates[0], 1, 2).await;
        match outcome {
            TileOutcome::Decoded(tile) => {
                assert_eq!(tile.format, TileFormat::Png);
                assert_eq!((tile.width(), tile.height()), (8, 8));
            }
            TileOutcome::Failed(f) => panic!("unexpected failure: {}", f),
        }
    }

    #[tokio::test]
    async fn test_fetch_tile_reports_status() {
        let mock = MockAsyncHttpClient::new();
        let templates = templates(&["http://a/{z}/{x}/{y}.png"]);
        let fetcher = TileFetcher::new(&mock, &templates, &[], 3, 8);

        match fetcher.fetch_tile(&templates[0], 1, 2).await {
            TileOutcome::Failed(failure) => {
                assert_eq!(failure.url, "http://a/3/1/2.png");
                assert_eq!(failure.http_status, Some(404));
            }
            TileOutcome::Decoded(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_fetch_tile_size_mismatch_is_failure() {
        let mock = MockAsyncHttpClient::always(Ok(png_tile(4, [0, 0, 0, 255])));
        let templates = templates(&["http://a/{z}/{x}/{y}.png"]);
        let fetcher = TileFetcher::new(&mock, &templates, &[], 3, 8);

        match fetcher.fetch_tile(&templates[0], 0, 0).await {
            TileOutcome::Failed(failure) => {
                assert_eq!(failure.http_status, None);
                assert_eq!(failure.reason, "wrong tile size: got 4x4, expected 8x8");
            }
            TileOutcome::Decoded(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_fallback_to_second_template() {
        let mock = MockAsyncHttpClient::new()
            .with_response(
                "http://primary/2/1/1",
                Err(ProviderError::HttpStatus {
                    status: 500,
                    url: "http://primary/2/1/1".to_string(),
                }),
            )
            .with_response("http://backup/2/1/1", Ok(jpeg_tile(8, [9, 9, 9])));
        let templates = templates(&["http://primary/{z}/{x}/{y}", "http://backup/{z}/{x}/{y}"]);
        let fetcher = TileFetcher::new(&mock, &templates, &[], 2, 8);

        let fetch = fetcher.fetch(1, 1).await;
        assert!(fetch.outcome.is_decoded());
        assert_eq!(fetch.attempts, 2);
        assert_eq!(
            mock.requested_urls(),
            vec!["http://primary/2/1/1", "http://backup/2/1/1"]
        );
    }

    #[tokio::test]
    async fn test_first_success_skips_remaining_templates() {
        let mock = MockAsyncHttpClient::always(Ok(png_tile(8, [0, 0, 0, 255])));
        let templates = templates(&["http://one/{z}/{x}/{y}", "http://two/{z}/{x}/{y}"]);
        let fetcher = TileFetcher::new(&mock, &templates, &[], 2, 8);

        let fetch = fetcher.fetch(0, 0).await;
        assert_eq!(fetch.attempts, 1);
        assert_eq!(mock.requested_urls(), vec!["http://one/2/0/0"]);
    }

    #[tokio::test]
    async fn test_all_templates_fail_keeps_last_failure() {
        let mock = MockAsyncHttpClient::new()
            .with_response("http://one/2/0/0", Err(ProviderError::HttpError("reset".into())))
            .with_response(
                "http://two/2/0/0",
                Err(ProviderError::HttpStatus {
                    status: 503,
                    url: "http://two/2/0/0".to_string(),
                }),
            );
        let templates = templates(&["http://one/{z}/{x}/{y}", "http://two/{z}/{x}/{y}"]);
        let fetcher = TileFetcher::new(&mock, &templates, &[], 2, 8);

        let fetch = fetcher.fetch(0, 0).await;
        assert_eq!(fetch.attempts, 2);
        match fetch.outcome {
            TileOutcome::Failed(failure) => {
                assert_eq!(failure.url, "http://two/2/0/0");
                assert_eq!(failure.http_status, Some(503));
            }
            TileOutcome::Decoded(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_extra_headers_sent() {
        let mock = MockAsyncHttpClient::always(Ok(png_tile(8, [0, 0, 0, 255])));
        let templates = templates(&["http://one/{z}/{x}/{y}"]);
        let headers = vec![("User-Agent".to_string(), "custom/1.0".to_string())];
        let fetcher = TileFetcher::new(&mock, &templates, &headers, 2, 8);

        fetcher.fetch(0, 0).await;

        let requests = mock.requests.lock().unwrap();
        assert_eq!(requests[0].headers, headers);
    }
}
