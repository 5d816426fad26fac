//! Tile compositing
//!
//! The [`Compositor`] owns the output canvas and the failure ledger for one
//! stitch operation. Tiles are blended in with source-over; failed tile
//! positions leave transparent gaps and are recorded in the ledger.

mod canvas;
mod ledger;

pub use canvas::{blend_over, Canvas};
pub use ledger::{ExhaustionReason, FailedTile, FailureLedger, LedgerVerdict};

use crate::grid::TileGridPlan;
use crate::provider::{DecodedTile, FetchFailure};
use image::RgbaImage;

/// Canvas plus ledger for a single stitch run.
#[derive(Debug)]
pub struct Compositor {
    canvas: Canvas,
    ledger: FailureLedger,
}

impl Compositor {
    /// Creates a transparent canvas sized for the plan.
    pub fn new(plan: &TileGridPlan) -> Self {
        Self {
            canvas: Canvas::new(plan.canvas_width, plan.canvas_height),
            ledger: FailureLedger::new(plan.tile_count()),
        }
    }

    /// Blends a decoded tile at its plan position and counts it as a success.
    pub fn place_tile(&mut self, plan: &TileGridPlan, tx: u32, ty: u32, tile: &DecodedTile) {
        let (x, y) = plan.tile_origin(tx, ty);
        self.canvas.place_tile(&tile.pixels, x, y);
        self.ledger.record_success();
    }

    /// Records a tile position whose templates all failed.
    pub fn record_failure(&mut self, tx: u32, ty: u32, attempts: u32, failure: FetchFailure) {
        self.ledger.record_failure(FailedTile {
            x: tx,
            y: ty,
            attempts,
            failure,
        });
    }

    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Applies the failure policy, consuming the compositor.
    ///
    /// The canvas is only handed out when the verdict is not exhaustion.
    pub fn finish(
        self,
        max_failure_ratio: f64,
    ) -> Result<(RgbaImage, FailureLedger), (ExhaustionReason, FailureLedger)> {
        match self.ledger.verdict(max_failure_ratio) {
            LedgerVerdict::Exhausted(reason) => Err((reason, self.ledger)),
            LedgerVerdict::Complete | LedgerVerdict::Partial => {
                Ok((self.canvas.into_image(), self.ledger))
            }
        }
    }
}
