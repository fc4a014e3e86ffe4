//! Metrics for synchronization runs.
//!
//! Recorded through the `metrics` facade. No exporter is installed here; the
//! calls are no-ops until the binary installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Devices reconciled, labelled by `outcome`.
pub const DEVICES_SYNCED: &str = "g2s_devices_synced_total";
/// Models created on the fly.
pub const MODELS_CREATED: &str = "g2s_models_created_total";
/// Wall time of a full run.
pub const SYNC_DURATION: &str = "g2s_sync_duration_seconds";

/// Metrics recorder for synchronization runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncMetrics;

impl SyncMetrics {
    /// Creates the recorder and registers metric descriptions.
    pub fn new() -> Self {
        Self::register_metrics();
        Self
    }

    fn register_metrics() {
        describe_counter!(
            DEVICES_SYNCED,
            "Total number of devices reconciled, by outcome"
        );
        describe_counter!(MODELS_CREATED, "Total number of models created");
        describe_histogram!(SYNC_DURATION, "Duration of a synchronization run");
    }

    /// Records one device outcome (`created`, `updated`, `unchanged`, `planned`, `failed`).
    pub fn record_device(&self, outcome: &'static str) {
        counter!(DEVICES_SYNCED, "outcome" => outcome).increment(1);
    }

    /// Records models created during a run.
    pub fn record_models_created(&self, count: u64) {
        if count > 0 {
            counter!(MODELS_CREATED).increment(count);
        }
    }

    /// Records the duration of a run.
    pub fn record_duration(&self, duration: Duration) {
        histogram!(SYNC_DURATION).record(duration.as_secs_f64());
    }
}
