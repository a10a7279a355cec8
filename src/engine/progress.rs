//! Progress bar for the drainer side of a CLI run.

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " items"
    )))
}

/// Advance the bar by `n`. Uses try_lock so the drainer never waits on the display; a skipped
/// update is caught up by the final refresh.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.update(n);
    }
}

/// Set the bar to `done` and redraw once the run is over.
pub fn finish_progress_bar(pb: &ProgressBar, done: usize) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.update_to(done);
        eprintln!();
    }
}
