//! Startup validation.
//!
//! Every check runs before the first device is fetched; any error aborts the
//! command.

use crate::config::{parse_level, AppConfig};
use colored::Colorize;

const PROJECTIONS: [&str; 2] = ["BASIC", "FULL"];

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Problems that prevent a run.
    pub errors: Vec<String>,
    /// Problems worth fixing that do not prevent a run.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Creates a new empty validation result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Returns true if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Prints the validation result to the console.
    pub fn print(&self) {
        if !self.warnings.is_empty() {
            println!();
            println!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            println!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates application configuration before a run.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the configuration. A dry run does not need the classifier.
    pub fn validate(config: &AppConfig, dry_run: bool) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_snipeit(config, &mut result);
        Self::validate_device_source(config, &mut result);
        Self::validate_classifier(config, dry_run || config.sync.dry_run, &mut result);
        Self::validate_retry(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_snipeit(config: &AppConfig, result: &mut ValidationResult) {
        if config.snipeit.api_token.is_empty() {
            result.add_error("Missing required config: API_TOKEN (Snipe-IT API token)");
        }

        let endpoint = config.snipeit.endpoint_url.trim();
        if endpoint.is_empty() {
            result.add_error("Missing required config: ENDPOINT_URL (Snipe-IT API root)");
        } else if endpoint.starts_with("http://") {
            result.add_warning(format!(
                "ENDPOINT_URL uses plain HTTP ({}). The API token is sent unencrypted.",
                endpoint
            ));
        } else if !endpoint.starts_with("https://") {
            result.add_error(format!(
                "ENDPOINT_URL must be an http(s) URL, got '{}'",
                endpoint
            ));
        }
    }

    fn validate_device_source(config: &AppConfig, result: &mut ValidationResult) {
        if let Some(path) = &config.google.devices_file {
            if !path.exists() {
                result.add_error(format!("Devices file not found: {}", path.display()));
            }
            return;
        }

        if config.google.access_token.is_empty() {
            result.add_error(
                "No device source: set GOOGLE_ACCESS_TOKEN for the directory API \
                 or DEVICES_FILE for an exported device list",
            );
        }
        if !PROJECTIONS.contains(&config.google.projection.as_str()) {
            result.add_error(format!(
                "GOOGLE_CHROMEOS_PROJECTION must be one of {:?}, got '{}'",
                PROJECTIONS, config.google.projection
            ));
        }
        if config.google.page_size == 0 {
            result.add_error("GOOGLE_CHROMEOS_PAGE_SIZE must be greater than zero");
        }
    }

    fn validate_classifier(config: &AppConfig, dry_run: bool, result: &mut ValidationResult) {
        if config.gemini.api_key.is_empty() {
            if dry_run {
                result.add_warning(
                    "Gemini_APIKEY not set. Unknown models cannot be created outside dry run.",
                );
            } else {
                result.add_error(
                    "Missing required config: Gemini_APIKEY (needed to classify new models)",
                );
            }
        }

        if config.sync.categories.is_empty() {
            result.add_warning(
                "GEMINI_CATEGORIES is empty. The classifier has no vocabulary to choose from.",
            );
        }
    }

    fn validate_retry(config: &AppConfig, result: &mut ValidationResult) {
        if config.retry.max_attempts == 0 {
            result.add_error("MAX_RETRIES must be at least 1");
        }
    }

    fn validate_logging(config: &AppConfig, result: &mut ValidationResult) {
        if parse_level(&config.logging.level).is_none() {
            result.add_warning(format!(
                "Unknown LOG_LEVEL '{}', using WARN",
                config.logging.level
            ));
        }
    }
}
