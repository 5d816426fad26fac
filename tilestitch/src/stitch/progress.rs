//! Stitch progress observation.

use crate::grid::TileGridPlan;
use std::sync::Arc;

/// Progress after one tile position has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileProgress {
    pub x: u32,
    pub y: u32,
    pub succeeded: bool,
    /// Positions processed so far, including this one
    pub processed: usize,
    pub total: usize,
}

/// Receives progress notifications from a running stitch.
///
/// Called from the stitch task between fetches, so implementations
/// should return quickly.
pub trait StitchObserver: Send + Sync {
    /// Called once the grid is resolved, before any fetch.
    fn on_plan(&self, _plan: &TileGridPlan) {}

    /// Called after every tile position.
    fn on_tile(&self, _progress: TileProgress) {}
}

/// Observer that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StitchObserver for NoopObserver {}

/// Shared observer handle.
pub type SharedStitchObserver = Arc<dyn StitchObserver>;
