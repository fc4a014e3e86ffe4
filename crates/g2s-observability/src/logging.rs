//! Logging infrastructure for google2snipe.
//!
//! This module provides structured logging using the tracing ecosystem, with
//! an optional append-only failure log file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Crates whose events the console filter admits by default.
const CRATES: [&str; 4] = ["g2s_core", "g2s_connectors", "g2s_cli", "google2snipe"];

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Console log level.
    pub level: Level,
    /// Whether to use JSON format on the console.
    pub json_format: bool,
    /// Whether to include span events.
    pub include_spans: bool,
    /// Whether to include file/line info.
    pub include_location: bool,
    /// Whether to include thread IDs.
    pub include_thread_ids: bool,
    /// Whether to include target (module path).
    pub include_target: bool,
    /// Persistent log file, appended to.
    pub file_path: Option<PathBuf>,
    /// Minimum level written to the file.
    pub file_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_spans: false,
            include_location: false,
            include_thread_ids: false,
            include_target: true,
            file_path: Some(PathBuf::from("snipeit_errors.log")),
            file_level: Level::WARN,
        }
    }
}

impl LoggingConfig {
    /// Creates a development configuration with more verbose output.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json_format: false,
            include_spans: true,
            include_location: true,
            include_thread_ids: true,
            include_target: true,
            ..Self::default()
        }
    }

    /// Creates a production configuration with JSON output.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            include_spans: false,
            include_location: false,
            include_thread_ids: false,
            include_target: true,
            ..Self::default()
        }
    }

    /// Console filter directives for this configuration.
    pub fn directives(&self) -> String {
        CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initializes the logging system with the given configuration.
///
/// `RUST_LOG` overrides the console filter. The file layer has its own level.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<(), LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let console_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_target(config.include_target)
            .boxed()
    } else {
        fmt::layer()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_target(config.include_target)
            .boxed()
    };

    let file_layer = match &config.file_path {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(LevelFilter::from_level(config.file_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer.with_filter(env_filter))
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Creates a span for a command invocation.
#[macro_export]
macro_rules! command_span {
    ($command:expr) => {
        tracing::info_span!("command", command = %$command)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.file_level, Level::WARN);
        assert_eq!(
            config.file_path.as_deref(),
            Some(std::path::Path::new("snipeit_errors.log"))
        );
        assert!(!config.json_format);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.json_format);
        assert!(config.file_path.is_some());
    }

    #[test]
    fn test_development_config() {
        let config = LoggingConfig::development();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.include_spans);
    }

    #[test]
    fn test_directives_cover_workspace_crates() {
        let directives = LoggingConfig::development().directives();
        assert!(directives.contains("g2s_core=DEBUG"));
        assert!(directives.contains("g2s_connectors=DEBUG"));
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.log");
        std::fs::write(&path, "earlier\n").unwrap();

        use std::io::Write;
        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "later").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "earlier\nlater\n");
    }

    #[test]
    fn test_open_log_file_missing_directory() {
        let path = PathBuf::from("/nonexistent-dir/failures.log");
        assert!(matches!(
            open_log_file(&path),
            Err(LoggingError::File { .. })
        ));
    }

    #[test]
    fn test_command_span_macro() {
        let span = crate::command_span!("sync");
        let _guard = span.enter();
    }
}
