//! # Progress Tracking Module
//!
//! Questo modulo gestisce il feedback durante le operazioni batch.
//!
//! ## Responsabilità:
//! - `BatchObserver`: hook chiamato all'inizio, dopo ogni file e alla fine di un batch
//! - `ProgressManager`: progress bar con `indicatif` per feedback real-time
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 42/70 (60%) ✅ photo.jpg: 45.2% saved
//! ```

use crate::result::OptimizationResult;
use crate::stats::BatchStats;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Watches a batch. `index` is the position of the file in submission order.
pub trait BatchObserver: Send + Sync {
    fn on_start(&self, _total: usize) {}

    fn on_file_complete(&self, _index: usize, _result: &OptimizationResult) {}

    fn on_finish(&self, _stats: &BatchStats) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Manages progress reporting for image optimization
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager; the length is set when the batch starts
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressManager {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_file_complete(&self, _index: usize, result: &OptimizationResult) {
        let name = result
            .source_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let message = match result.error() {
            None => format!("✅ {}: {:.1}% saved", name, result.compression_percentage()),
            Some(error) => format!("❌ {}: {}", name, error),
        };
        self.update(&message);
    }

    fn on_finish(&self, stats: &BatchStats) {
        self.finish(&stats.format_summary());
    }
}
