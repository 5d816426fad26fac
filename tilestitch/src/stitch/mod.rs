//! Stitch orchestration
//!
//! Ties the pipeline together:
//!
//! ```text
//! RegionRequest + StitchOptions
//!        │
//!        ▼
//!   resolve grid ──► fetch tile (templates in order) ──► composite ──┐
//!                          ▲                                         │
//!                          └──────── next position (row-major) ◄─────┘
//!        │
//!        ▼
//!   failure policy ──► encode PNG (+ world file) ──► StitchResult
//! ```

mod error;
mod options;
mod progress;
mod stitcher;

pub use error::{CancelReason, StitchError, StitchNotice, StitchResult};
pub use options::{StitchLimits, StitchOptions, DEFAULT_MAX_FAILURE_RATIO};
pub use progress::{NoopObserver, SharedStitchObserver, StitchObserver, TileProgress};
pub use stitcher::{plan_stitch, Stitcher};
