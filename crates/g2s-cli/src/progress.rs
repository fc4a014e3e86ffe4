//! Terminal progress for synchronization runs.

use g2s_core::{SyncProgress, SyncReport, UpsertError, UpsertOutcome};
use g2s_observability::SyncMetrics;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar that also feeds the per-device metrics.
pub struct SyncProgressBar {
    bar: ProgressBar,
    metrics: SyncMetrics,
}

impl SyncProgressBar {
    /// Creates a visible progress bar. Dry runs use a different color.
    pub fn new(dry_run: bool, metrics: SyncMetrics) -> Self {
        let template = if dry_run {
            "{spinner:.yellow} (dry-run) [{elapsed_precise}] [{bar:40.yellow/blue}] {pos}/{len} {msg}"
        } else {
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
        };

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        Self { bar, metrics }
    }

    /// Creates a progress sink that draws nothing (JSON output).
    pub fn hidden(metrics: SyncMetrics) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            metrics,
        }
    }
}

impl SyncProgress for SyncProgressBar {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_device(&self, serial: &str, result: &Result<UpsertOutcome, UpsertError>) {
        let outcome = match result {
            Ok(outcome) => outcome.label(),
            Err(_) => "failed",
        };
        self.metrics.record_device(outcome);
        self.bar.set_message(format!("{} {}", serial, outcome));
        self.bar.inc(1);
    }

    fn on_finish(&self, report: &SyncReport) {
        self.metrics.record_models_created(report.models_created);
        self.metrics
            .record_duration(Duration::from_millis(report.duration_ms));
        self.bar.finish_and_clear();
    }
}
