//! Progress bar utilities for displaying processing status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::types::{ItemCallback, WorkItem};

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

/// Update progress bar if available.
/// Uses try_lock so workers never wait on the bar; a skipped tick is caught up by the final refresh.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Bring the bar to its final count once all workers have exited.
pub fn finish_progress_bar(pb: &ProgressBar, done: usize) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.update_to(done);
        let _ = bar.refresh();
        eprintln!();
    }
}

/// Per-item callback for [`PipelineOpts::on_item_done`](crate::PipelineOpts::on_item_done).
pub fn item_progress_callback(bar: &ProgressBar) -> ItemCallback {
    let bar = Arc::clone(bar);
    Arc::new(move |_item: &WorkItem| update_progress_bar(&bar, 1))
}
