//! Synchronization driver.
//!
//! Runs the upsert engine over a device list and aggregates the outcomes.
//! A failed device is recorded and logged; it never stops the run.

use crate::upsert::{PlannedAction, UpsertEngine, UpsertError, UpsertOutcome};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use g2s_connectors::DeviceRecord;
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};

/// Driver options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Devices reconciled at the same time. One means strictly sequential.
    pub concurrency: usize,
    /// Stop after this many devices.
    pub limit: Option<usize>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            limit: None,
        }
    }
}

/// Progress callbacks for interactive output.
pub trait SyncProgress: Send + Sync {
    /// Called once with the number of devices to process.
    fn on_start(&self, _total: usize) {}

    /// Called after each device.
    fn on_device(&self, _serial: &str, _result: &Result<UpsertOutcome, UpsertError>) {}

    /// Called once with the final report.
    fn on_finish(&self, _report: &SyncReport) {}
}

/// Progress sink that ignores everything.
pub struct NoProgress;

impl SyncProgress for NoProgress {}

/// A device that could not be reconciled.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceFailure {
    /// Device serial.
    pub serial: String,
    /// Failure category (see [`UpsertError::kind`]).
    pub kind: String,
    /// Full diagnostic.
    pub error: String,
}

/// A dry-run plan for one device.
#[derive(Debug, Clone, Serialize)]
pub struct DevicePlan {
    /// Device serial.
    pub serial: String,
    /// The planned action.
    pub action: PlannedAction,
}

/// Result of a synchronization run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Devices processed.
    pub processed: u64,
    /// Assets created.
    pub created: u64,
    /// Assets updated.
    pub updated: u64,
    /// Existing assets with nothing to update.
    pub unchanged: u64,
    /// Devices planned in a dry run.
    pub planned: u64,
    /// Devices that failed.
    pub failed: u64,
    /// Models created on the fly.
    pub models_created: u64,
    /// Failure details.
    pub failures: Vec<DeviceFailure>,
    /// Dry-run plans.
    pub plans: Vec<DevicePlan>,
    /// Total duration of the run in milliseconds.
    pub duration_ms: u64,
    /// Timestamp when the run completed.
    pub completed_at: DateTime<Utc>,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self {
            processed: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            planned: 0,
            failed: 0,
            models_created: 0,
            failures: Vec::new(),
            plans: Vec::new(),
            duration_ms: 0,
            completed_at: Utc::now(),
        }
    }
}

impl SyncReport {
    /// Returns whether every device was reconciled.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, serial: String, result: Result<UpsertOutcome, UpsertError>) {
        self.processed += 1;
        match result {
            Ok(UpsertOutcome::Created { .. }) => self.created += 1,
            Ok(UpsertOutcome::Updated { .. }) => self.updated += 1,
            Ok(UpsertOutcome::Unchanged { .. }) => self.unchanged += 1,
            Ok(UpsertOutcome::Planned(action)) => {
                self.planned += 1;
                self.plans.push(DevicePlan { serial, action });
            }
            Err(e) => {
                self.failed += 1;
                self.failures.push(DeviceFailure {
                    serial,
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Drives the upsert engine over a device list.
pub struct SyncDriver {
    engine: UpsertEngine,
    options: SyncOptions,
}

impl SyncDriver {
    /// Creates a driver.
    pub fn new(engine: UpsertEngine, options: SyncOptions) -> Self {
        Self { engine, options }
    }

    /// Reconciles every device and returns the run report.
    pub async fn run(
        &self,
        devices: Vec<DeviceRecord>,
        progress: &dyn SyncProgress,
    ) -> SyncReport {
        let started = Instant::now();
        let devices: Vec<DeviceRecord> = match self.options.limit {
            Some(limit) => devices.into_iter().take(limit).collect(),
            None => devices,
        };
        let concurrency = self.options.concurrency.max(1);

        // The resolver counter spans the driver's lifetime; report this run only.
        let models_before = self.engine.resolver().models_created();

        info!(devices = devices.len(), concurrency, "Starting synchronization");
        progress.on_start(devices.len());

        let mut results = stream::iter(devices)
            .map(|device| {
                let span = info_span!("device", serial = %device.serial);
                async move {
                    let result = self.engine.upsert(&device).await;
                    (device.serial, result)
                }
                .instrument(span)
            })
            .buffer_unordered(concurrency);

        let mut report = SyncReport::default();
        while let Some((serial, result)) = results.next().await {
            if let Err(e) = &result {
                error!(
                    serial = %serial,
                    kind = e.kind(),
                    error = %e,
                    "Device synchronization failed"
                );
            }
            progress.on_device(&serial, &result);
            report.record(serial, result);
        }

        report.models_created = self
            .engine
            .resolver()
            .models_created()
            .saturating_sub(models_before);
        report.duration_ms = started.elapsed().as_millis() as u64;
        report.completed_at = Utc::now();

        info!(
            processed = report.processed,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            planned = report.planned,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Synchronization finished"
        );
        progress.on_finish(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ModelClassifier;
    use crate::resolver::ReferenceResolver;
    use crate::settings::SyncSettings;
    use g2s_connectors::testing::sample_device;
    use g2s_connectors::{
        DirectoryConnector, MockAssetManagement, MockClassifier, MockDirectory, RecordedCall,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn driver(
        mock: MockAssetManagement,
        reply: &str,
        options: SyncOptions,
    ) -> (SyncDriver, Arc<MockAssetManagement>, Arc<MockClassifier>) {
        let settings = SyncSettings::default();
        let mock = Arc::new(mock);
        let ai = Arc::new(MockClassifier::new("ai", reply));
        let classifier = Arc::new(ModelClassifier::new(ai.clone(), settings.categories.clone()));
        let resolver = Arc::new(ReferenceResolver::new(
            mock.clone(),
            classifier,
            settings.clone(),
        ));
        let engine = UpsertEngine::new(mock.clone(), resolver, settings);
        (SyncDriver::new(engine, options), mock, ai)
    }

    #[derive(Default)]
    struct CountingProgress {
        started: AtomicUsize,
        devices: AtomicUsize,
        finished: AtomicUsize,
    }

    impl SyncProgress for CountingProgress {
        fn on_start(&self, total: usize) {
            self.started.store(total, Ordering::SeqCst);
        }

        fn on_device(&self, _serial: &str, _result: &Result<UpsertOutcome, UpsertError>) {
            self.devices.fetch_add(1, Ordering::SeqCst);
        }

        fn on_finish(&self, _report: &SyncReport) {
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let (driver, _, _) = driver(
            MockAssetManagement::new("snipe").with_model(42, "Widget X"),
            "no idea",
            SyncOptions::default(),
        );
        let devices = vec![
            sample_device("SN001", "Widget X"),
            sample_device("SN002", "Unknown Thing"),
            DeviceRecord::new(""),
            sample_device("SN003", "Widget X"),
        ];
        let progress = CountingProgress::default();

        let report = driver.run(devices, &progress).await;

        assert_eq!(report.processed, 4);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 2);
        assert!(!report.is_clean());
        let kinds: Vec<_> = report.failures.iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, vec!["resolve", "missing_serial"]);
        assert_eq!(progress.started.load(Ordering::SeqCst), 4);
        assert_eq!(progress.devices.load(Ordering::SeqCst), 4);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_limit() {
        let (driver, mock, _) = driver(
            MockAssetManagement::new("snipe").with_model(42, "Widget X"),
            "",
            SyncOptions {
                concurrency: 1,
                limit: Some(1),
            },
        );
        let devices = vec![
            sample_device("SN001", "Widget X"),
            sample_device("SN002", "Widget X"),
        ];

        let report = driver.run(devices, &NoProgress).await;

        assert_eq!(report.processed, 1);
        assert_eq!(mock.asset_count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_run_creates_shared_model_once() {
        let (driver, mock, ai) = driver(
            MockAssetManagement::new("snipe").with_category(12, "Chromebook"),
            "**Chromebook**",
            SyncOptions {
                concurrency: 4,
                limit: None,
            },
        );
        let devices = (1..=8)
            .map(|i| sample_device(&format!("SN{:03}", i), "Widget Z"))
            .collect();

        let report = driver.run(devices, &NoProgress).await;

        assert!(report.is_clean());
        assert_eq!(report.created, 8);
        assert_eq!(report.models_created, 1);
        assert_eq!(ai.call_count(), 1);
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::CreateModel(_)))
                .await,
            1
        );
    }

    #[tokio::test]
    async fn test_second_run_converges() {
        let (driver, mock, _) = driver(
            MockAssetManagement::new("snipe").with_model(42, "Widget X"),
            "",
            SyncOptions::default(),
        );
        let devices = vec![
            sample_device("SN001", "Widget X"),
            sample_device("SN002", "Widget X"),
        ];

        let first = driver.run(devices.clone(), &NoProgress).await;
        let second = driver.run(devices, &NoProgress).await;

        assert_eq!(first.created, 2);
        assert_eq!(second.updated, 2);
        assert_eq!(second.created, 0);
        assert_eq!(mock.asset_count().await, 2);
    }

    #[tokio::test]
    async fn test_models_created_counts_this_run_only() {
        let (driver, _, ai) = driver(
            MockAssetManagement::new("snipe").with_category(12, "Chromebook"),
            "**Chromebook**",
            SyncOptions::default(),
        );
        let devices = vec![sample_device("SN001", "Widget Z")];

        let first = driver.run(devices.clone(), &NoProgress).await;
        let second = driver.run(devices, &NoProgress).await;

        assert_eq!(first.models_created, 1);
        assert_eq!(second.models_created, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn test_run_over_directory_listing() {
        let directory = MockDirectory::new(
            "directory",
            vec![
                sample_device("SN001", "Widget X"),
                DeviceRecord::new("SN002"),
            ],
        );
        let (driver, mock, _) = driver(
            MockAssetManagement::new("snipe").with_model(42, "Widget X"),
            "",
            SyncOptions::default(),
        );

        let devices = directory.list_devices().await.unwrap();
        let report = driver.run(devices, &NoProgress).await;

        assert!(report.is_clean());
        assert_eq!(report.created, 2);
        let fields = mock.asset_fields("SN002").await.unwrap();
        assert_eq!(
            fields["model_id"],
            serde_json::json!(SyncSettings::default().default_model_id)
        );
    }
}
