//! # g2s-observability
//!
//! Logging and metrics for google2snipe.
//!
//! Console output goes through a `tracing` fmt layer; warnings and errors are
//! also appended to a persistent log file so per-device failures survive the
//! interactive session.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging_with_config, LoggingConfig, LoggingError};
pub use metrics::SyncMetrics;
