//! Progress counter for hashed files (stderr).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (shows count without percentage).
/// Names may still be streaming in on stdin, so the total is never known up front.
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " files"
    )))
}

/// Update progress bar if available.
/// Uses try_lock so hasher threads never wait on the bar; a skipped tick is caught up by the final refresh.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Set the final count and redraw once the run is over.
pub fn finish_counter(pb: &ProgressBar, count: usize) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.update_to(count);
        let _ = bar.refresh();
        eprintln!();
    }
}
