//! Progress reporting for the fetch loop.
//!
//! Progress is advisory telemetry: `totalCount` is live and may fluctuate
//! between requests, so the percentage is best effort. The loop guarantees
//! exactly 100 at completion.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Sink for advisory percentage updates.
pub trait ProgressSink {
    fn report(&mut self, percent: f64);
}

/// Terminal progress bar, 0-100.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}% {msg}")
                .expect("valid progress template")
                .progress_chars("##-"),
        );
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn report(&mut self, percent: f64) {
        let position = percent.round().clamp(0.0, 100.0) as u64;
        self.bar.set_position(position);
        if position >= 100 {
            self.bar.finish();
        }
    }
}

/// Log-only progress, for non-interactive runs.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, percent: f64) {
        info!(percent = format!("{percent:.1}"), "Fetch progress");
    }
}
