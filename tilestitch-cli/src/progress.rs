//! Terminal progress bar for a running stitch.

use indicatif::{ProgressBar, ProgressStyle};
use tilestitch::grid::TileGridPlan;
use tilestitch::stitch::{StitchObserver, TileProgress};

const TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tiles {msg}";

/// Shows tile progress on stderr.
pub struct StitchProgress {
    bar: ProgressBar,
}

impl StitchProgress {
    /// A visible bar when `enabled`, otherwise a hidden one.
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StitchObserver for StitchProgress {
    fn on_plan(&self, plan: &TileGridPlan) {
        self.bar.set_length(plan.tile_count() as u64);
        self.bar
            .set_message(format!("({}x{} px)", plan.canvas_width, plan.canvas_height));
    }

    fn on_tile(&self, progress: TileProgress) {
        self.bar.set_position(progress.processed as u64);
        if !progress.succeeded {
            self.bar.set_message(format!(
                "(tile {}/{} failed)",
                progress.x, progress.y
            ));
        }
    }
}
