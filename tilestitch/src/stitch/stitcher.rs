//! The stitch pipeline: plan, fetch, composite, encode.

use super::error::{CancelReason, StitchError, StitchNotice, StitchResult};
use super::options::StitchOptions;
use super::progress::{NoopObserver, SharedStitchObserver, TileProgress};
use crate::composite::Compositor;
use crate::grid::{resolve_tile_range_with_limit, RegionRequest, TileGridPlan};
use crate::output::{encode_canvas, WorldFile};
use crate::provider::{AsyncHttpClient, AsyncReqwestClient, FetchConfig, TileFetcher, TileOutcome};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Resolves the tile grid for a request without fetching anything.
pub fn plan_stitch(
    request: &RegionRequest,
    options: &StitchOptions,
) -> Result<TileGridPlan, StitchError> {
    options.validate()?;
    let plan = resolve_tile_range_with_limit(
        request,
        options.zoom,
        options.tile_size,
        options.limits.max_pixels,
    )?;
    Ok(plan)
}

/// Stitches map tiles into a single image.
///
/// Tile positions are fetched one at a time in row-major order. The client
/// is reused across stitches; no other state survives a call.
///
/// # Example
///
/// ```ignore
/// use tilestitch::grid::RegionRequest;
/// use tilestitch::provider::FetchConfig;
/// use tilestitch::stitch::{StitchOptions, Stitcher};
/// use tokio_util::sync::CancellationToken;
///
/// let stitcher = Stitcher::with_fetch_config(&FetchConfig::default())?;
/// let region = RegionRequest::bbox(37.37, -122.92, 38.23, -121.56);
/// let options = StitchOptions::new(10, "https://tile.example.com/{z}/{x}/{y}.png");
/// let result = stitcher.stitch(&region, &options, &CancellationToken::new()).await?;
/// std::fs::write("bay_area.png", &result.image_bytes)?;
/// ```
pub struct Stitcher<C: AsyncHttpClient> {
    client: C,
    observer: SharedStitchObserver,
}

impl Stitcher<AsyncReqwestClient> {
    /// Creates a stitcher backed by a reqwest client.
    pub fn with_fetch_config(config: &FetchConfig) -> Result<Self, StitchError> {
        let client =
            AsyncReqwestClient::new(config).map_err(|e| StitchError::HttpClient(e.to_string()))?;
        Ok(Self::new(client))
    }
}

impl<C: AsyncHttpClient> Stitcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attaches a progress observer.
    pub fn with_observer(mut self, observer: SharedStitchObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Runs a complete stitch.
    ///
    /// Cancellation and the options' deadline are checked before each fetch
    /// and raced against the fetch in flight. Either aborts the run with
    /// [`StitchError::Cancelled`]; no partial image is returned.
    pub async fn stitch(
        &self,
        request: &RegionRequest,
        options: &StitchOptions,
        cancel: &CancellationToken,
    ) -> Result<StitchResult, StitchError> {
        let started = StdInstant::now();
        let deadline = options.deadline.map(|d| (Instant::now() + d, d));

        let templates = options.validate()?;
        let plan = resolve_tile_range_with_limit(
            request,
            options.zoom,
            options.tile_size,
            options.limits.max_pixels,
        )?;

        info!(
            mode = request.mode_name(),
            zoom = plan.zoom,
            tiles_x = %format!("{}-{}", plan.tx1, plan.tx2),
            tiles_y = %format!("{}-{}", plan.ty1, plan.ty2),
            tile_count = plan.tile_count(),
            width = plan.canvas_width,
            height = plan.canvas_height,
            "Stitch planned"
        );
        self.observer.on_plan(&plan);

        let fetcher = TileFetcher::new(
            &self.client,
            &templates,
            &options.extra_headers,
            plan.zoom,
            plan.tile_size,
        );
        let mut compositor = Compositor::new(&plan);
        let total = plan.tile_count();

        for (tx, ty) in plan.tiles() {
            if let Err(reason) = check_interrupted(cancel, deadline) {
                return Err(interrupted(
                    reason,
                    compositor.ledger().processed(),
                    total,
                ));
            }

            let fetch = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(interrupted(
                        CancelReason::Cancelled,
                        compositor.ledger().processed(),
                        total,
                    ));
                }
                _ = deadline_elapsed(deadline.map(|(at, _)| at)) => {
                    let after = deadline.map(|(_, d)| d).unwrap_or_default();
                    return Err(interrupted(
                        CancelReason::DeadlineExceeded { after },
                        compositor.ledger().processed(),
                        total,
                    ));
                }
                fetch = fetcher.fetch(tx, ty) => fetch,
            };

            let succeeded = match fetch.outcome {
                TileOutcome::Decoded(tile) => {
                    compositor.place_tile(&plan, tx, ty, &tile);
                    true
                }
                TileOutcome::Failed(failure) => {
                    compositor.record_failure(tx, ty, fetch.attempts, failure);
                    false
                }
            };

            self.observer.on_tile(TileProgress {
                x: tx,
                y: ty,
                succeeded,
                processed: compositor.ledger().processed(),
                total,
            });
        }

        let (canvas, ledger) = compositor
            .finish(options.limits.max_failure_ratio)
            .map_err(|(reason, ledger)| {
                warn!(
                    successful = ledger.successful_tiles(),
                    failed = ledger.failed_count(),
                    total = ledger.total_tiles(),
                    %reason,
                    "Tile fetching exhausted"
                );
                StitchError::TileFetchExhausted { reason, ledger }
            })?;

        let mut notices = Vec::new();
        let format = options.output_format.encoded_as();
        if format != options.output_format {
            warn!(
                requested = %options.output_format,
                used = %format,
                "Output format not supported, falling back"
            );
            notices.push(StitchNotice::UnsupportedOutputFormat {
                requested: options.output_format,
                used: format,
            });
        }

        let image_bytes = Bytes::from(encode_canvas(&canvas)?);
        debug!(bytes = image_bytes.len(), "Canvas encoded");

        let world_file = options.generate_world_file.then(|| {
            WorldFile::new(
                plan.pixel_size_x,
                plan.pixel_size_y,
                plan.projected_min_x,
                plan.projected_max_y,
            )
        });
        let world_file_bytes = world_file.as_ref().map(WorldFile::to_bytes);

        info!(
            width = plan.canvas_width,
            height = plan.canvas_height,
            successful = ledger.successful_tiles(),
            failed = ledger.failed_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stitch complete"
        );

        Ok(StitchResult {
            image_bytes,
            format,
            world_file,
            world_file_bytes,
            width: plan.canvas_width,
            height: plan.canvas_height,
            projected_min_x: plan.projected_min_x,
            projected_max_y: plan.projected_max_y,
            pixel_size_x: plan.pixel_size_x,
            pixel_size_y: plan.pixel_size_y,
            ledger,
            notices,
        })
    }
}

/// Logs an interruption and converts it to an error.
fn interrupted(reason: CancelReason, processed: usize, total: usize) -> StitchError {
    match reason {
        CancelReason::Cancelled => info!(processed, total, "Stitch cancelled"),
        CancelReason::DeadlineExceeded { after } => warn!(
            processed,
            total,
            deadline_secs = after.as_secs_f64(),
            "Stitch deadline exceeded"
        ),
    }
    StitchError::Cancelled(reason)
}

/// Checks cancellation and the deadline without waiting.
fn check_interrupted(
    cancel: &CancellationToken,
    deadline: Option<(Instant, Duration)>,
) -> Result<(), CancelReason> {
    if cancel.is_cancelled() {
        return Err(CancelReason::Cancelled);
    }
    match deadline {
        Some((at, after)) if Instant::now() >= at => {
            Err(CancelReason::DeadlineExceeded { after })
        }
        _ => Ok(()),
    }
}

/// Completes when the deadline passes; never completes without one.
async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
