//! Configuration loading for the google2snipe CLI.
//!
//! Values come from an optional YAML file, then from the process environment
//! (after `.env` has been loaded), so existing deployments driven purely by
//! environment variables keep working.

use anyhow::{Context, Result};
use g2s_connectors::{
    AuthConfig, ConnectorConfig, GeminiConfig, GoogleDirectoryConfig, SecureString, SnipeItConfig,
};
use g2s_core::SyncSettings;
use g2s_observability::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

const REDACTED: &str = "***REDACTED***";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Snipe-IT instance.
    #[serde(default)]
    pub snipeit: SnipeItSection,

    /// Google directory (or a devices export file).
    #[serde(default)]
    pub google: GoogleSection,

    /// Gemini classification service.
    #[serde(default)]
    pub gemini: GeminiSection,

    /// Retry behavior shared by every connector.
    #[serde(default)]
    pub retry: RetrySection,

    /// Reconciliation settings.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogSection,

    /// Debug output on the console.
    #[serde(default)]
    pub debug: bool,
}

/// Snipe-IT connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnipeItSection {
    /// API root, including `/api/v1`.
    #[serde(default)]
    pub endpoint_url: String,

    /// Personal API token.
    #[serde(default)]
    pub api_token: SecureString,

    /// Client-side request budget per minute.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Rows requested per search.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_requests_per_minute() -> u32 {
    120
}

fn default_search_limit() -> u32 {
    50
}

fn default_timeout() -> u64 {
    30
}

impl Default for SnipeItSection {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_token: SecureString::default(),
            requests_per_minute: default_requests_per_minute(),
            search_limit: default_search_limit(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Device source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSection {
    /// Admin SDK root.
    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    /// OAuth access token with the ChromeOS device read scope.
    #[serde(default)]
    pub access_token: SecureString,

    /// Workspace customer id.
    #[serde(default = "g2s_connectors::directory::google::default_customer_id")]
    pub customer_id: String,

    /// Devices per page.
    #[serde(default = "g2s_connectors::directory::google::default_page_size")]
    pub page_size: u32,

    /// `BASIC` or `FULL`.
    #[serde(default = "g2s_connectors::directory::google::default_projection")]
    pub projection: String,

    /// JSON export used instead of the directory API.
    #[serde(default)]
    pub devices_file: Option<PathBuf>,
}

fn default_google_base_url() -> String {
    "https://admin.googleapis.com".to_string()
}

impl Default for GoogleSection {
    fn default() -> Self {
        Self {
            base_url: default_google_base_url(),
            access_token: SecureString::default(),
            customer_id: g2s_connectors::directory::google::default_customer_id(),
            page_size: g2s_connectors::directory::google::default_page_size(),
            projection: g2s_connectors::directory::google::default_projection(),
            devices_file: None,
        }
    }
}

/// Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSection {
    /// Generative Language API root.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// API key.
    #[serde(default)]
    pub api_key: SecureString,

    /// Model name.
    #[serde(default = "g2s_connectors::classifier::gemini::default_model")]
    pub model: String,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            api_key: SecureString::default(),
            model: g2s_connectors::classifier::gemini::default_model(),
        }
    }
}

/// Retry settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySection {
    /// Attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_delay_secs() -> u64 {
    20
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Level for the persistent log file.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Persistent log file; `None` disables it.
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    /// JSON console output.
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("snipeit_errors.log"))
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads the file when it exists, then applies the process environment.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies environment overrides read through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("API_TOKEN") {
            self.snipeit.api_token = SecureString::new(v);
        }
        if let Some(v) = get("ENDPOINT_URL") {
            self.snipeit.endpoint_url = v;
        }

        let fields = &mut self.sync.fields;
        if let Some(v) = get("SNIPE_IT_FIELD_MAC_ADDRESS") {
            fields.mac_address = v;
        }
        if let Some(v) = get("SNIPE_IT_FIELD_SYNC_DATE") {
            fields.sync_date = v;
        }
        if let Some(v) = get("SNIPE_IT_FIELD_IP_ADDRESS") {
            fields.ip_address = v;
        }
        if let Some(v) = get("SNIPE_IT_FIELD_USER") {
            fields.user = v;
        }

        if let Some(v) = get("SNIPE_IT_DEFAULT_MODEL_ID") {
            self.sync.default_model_id = parse_number("SNIPE_IT_DEFAULT_MODEL_ID", &v)?;
        }
        if let Some(v) = get("SNIPE_IT_FIELDSET_ID") {
            self.sync.fieldset_id = parse_number("SNIPE_IT_FIELDSET_ID", &v)?;
        }
        if let Some(v) = get("SNIPE_IT_DEFAULT_STATUS_ID") {
            let id = parse_number("SNIPE_IT_DEFAULT_STATUS_ID", &v)?;
            self.sync.active_status_id = id;
            self.sync.fallback_status_id = id;
        }
        if let Some(v) = get("SNIPE_IT_ACTIVE_STATUS") {
            self.sync.active_status_label = v;
        }

        if let Some(v) = get("GOOGLE_ACCESS_TOKEN") {
            self.google.access_token = SecureString::new(v);
        }
        if let Some(v) = get("GOOGLE_CUSTOMER_ID") {
            self.google.customer_id = v;
        }
        if let Some(v) = get("GOOGLE_CHROMEOS_PAGE_SIZE") {
            self.google.page_size = parse_number("GOOGLE_CHROMEOS_PAGE_SIZE", &v)?;
        }
        if let Some(v) = get("GOOGLE_CHROMEOS_PROJECTION") {
            self.google.projection = v.to_uppercase();
        }
        if let Some(v) = get("DEVICES_FILE") {
            self.google.devices_file = Some(PathBuf::from(v));
        }

        if let Some(v) = get("Gemini_APIKEY") {
            self.gemini.api_key = SecureString::new(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.gemini.model = v;
        }
        if let Some(v) = get("GEMINI_CATEGORIES") {
            self.sync.categories = parse_categories(&v);
        }

        if let Some(v) = get("MAX_RETRIES") {
            self.retry.max_attempts = parse_number("MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("RETRY_DELAY_SECONDS") {
            self.retry.delay_secs = parse_number("RETRY_DELAY_SECONDS", &v)?;
        }

        if let Some(v) = get("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = get("DRY_RUN") {
            self.sync.dry_run = parse_flag(&v);
        }
        if let Some(v) = get("DEBUG") {
            self.debug = parse_flag(&v);
        }

        Ok(())
    }

    /// Creates a copy with secrets redacted.
    pub fn redact_secrets(&self) -> Self {
        let mut config = self.clone();

        for secret in [
            &mut config.snipeit.api_token,
            &mut config.google.access_token,
            &mut config.gemini.api_key,
        ] {
            if !secret.is_empty() {
                *secret = SecureString::from(REDACTED);
            }
        }

        config
    }

    /// Snipe-IT connector configuration.
    pub fn snipeit_config(&self) -> SnipeItConfig {
        SnipeItConfig {
            connector: self.connector_config(
                "snipeit",
                &self.snipeit.endpoint_url,
                AuthConfig::BearerToken {
                    token: self.snipeit.api_token.clone(),
                },
                self.snipeit.timeout_secs,
            ),
            search_limit: self.snipeit.search_limit,
            requests_per_minute: self.snipeit.requests_per_minute,
        }
    }

    /// Google directory connector configuration.
    pub fn google_config(&self) -> GoogleDirectoryConfig {
        GoogleDirectoryConfig {
            connector: self.connector_config(
                "google",
                &self.google.base_url,
                AuthConfig::BearerToken {
                    token: self.google.access_token.clone(),
                },
                default_timeout(),
            ),
            customer_id: self.google.customer_id.clone(),
            page_size: self.google.page_size,
            projection: self.google.projection.clone(),
        }
    }

    /// Gemini connector configuration.
    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            connector: self.connector_config(
                "gemini",
                &self.gemini.base_url,
                AuthConfig::ApiKey {
                    key: self.gemini.api_key.clone(),
                    header_name: "x-goog-api-key".to_string(),
                },
                default_timeout(),
            ),
            model: self.gemini.model.clone(),
        }
    }

    /// Reconciliation settings, with dry run forced on when requested.
    pub fn sync_settings(&self, dry_run: bool) -> SyncSettings {
        let mut settings = self.sync.clone();
        settings.dry_run |= dry_run;
        settings
    }

    /// Logging configuration for this run.
    pub fn logging_config(&self, verbose: bool, json: bool) -> LoggingConfig {
        let level = if verbose || self.debug {
            Level::DEBUG
        } else {
            Level::INFO
        };
        LoggingConfig {
            level,
            json_format: json || self.logging.json_format,
            file_path: self.logging.file.clone(),
            file_level: parse_level(&self.logging.level).unwrap_or(Level::WARN),
            ..LoggingConfig::default()
        }
    }

    fn connector_config(
        &self,
        name: &str,
        base_url: &str,
        auth: AuthConfig,
        timeout_secs: u64,
    ) -> ConnectorConfig {
        ConnectorConfig {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            timeout_secs,
            max_attempts: self.retry.max_attempts,
            retry_delay_secs: self.retry.delay_secs,
            verify_tls: true,
            headers: HashMap::new(),
        }
    }
}

/// Parses a log level name, accepting the `warning` and `critical` spellings.
pub fn parse_level(value: &str) -> Option<Level> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    if value.eq_ignore_ascii_case("critical") {
        return Some(Level::ERROR);
    }
    Level::from_str(value).ok()
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a number, got '{}'", key, value))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn parse_categories(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.delay_secs, 20);
        assert_eq!(config.google.page_size, 300);
        assert_eq!(config.google.projection, "FULL");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(
            config.logging.file,
            Some(PathBuf::from("snipeit_errors.log"))
        );
        assert_eq!(config.sync.default_model_id, 87);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("API_TOKEN", "snipe-token"),
                ("ENDPOINT_URL", "https://snipe.example.org/api/v1"),
                ("SNIPE_IT_FIELD_MAC_ADDRESS", "_snipeit_mac_2"),
                ("SNIPE_IT_DEFAULT_MODEL_ID", "12"),
                ("SNIPE_IT_DEFAULT_STATUS_ID", "5"),
                ("GOOGLE_CHROMEOS_PROJECTION", "basic"),
                ("Gemini_APIKEY", "gem-key"),
                ("GEMINI_CATEGORIES", "Desktop, Chromebook ,,"),
                ("MAX_RETRIES", "2"),
                ("DRY_RUN", "TRUE"),
                ("DEBUG", "false"),
            ]))
            .unwrap();

        assert_eq!(config.snipeit.api_token.expose_secret(), "snipe-token");
        assert_eq!(config.snipeit.endpoint_url, "https://snipe.example.org/api/v1");
        assert_eq!(config.sync.fields.mac_address, "_snipeit_mac_2");
        assert_eq!(config.sync.default_model_id, 12);
        assert_eq!(config.sync.active_status_id, 5);
        assert_eq!(config.sync.fallback_status_id, 5);
        assert_eq!(config.google.projection, "BASIC");
        assert_eq!(config.gemini.api_key.expose_secret(), "gem-key");
        assert_eq!(config.sync.categories, vec!["Desktop", "Chromebook"]);
        assert_eq!(config.retry.max_attempts, 2);
        assert!(config.sync.dry_run);
        assert!(!config.debug);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("ENDPOINT_URL", "  "), ("GEMINI_MODEL", "")]))
            .unwrap();
        assert!(config.snipeit.endpoint_url.is_empty());
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("SNIPE_IT_FIELDSET_ID", "nine")]))
            .unwrap_err();
        assert!(err.to_string().contains("SNIPE_IT_FIELDSET_ID"));
    }

    #[test]
    fn test_redact_secrets() {
        let mut config = AppConfig::default();
        config.snipeit.api_token = SecureString::from("snipe-token");
        config.gemini.api_key = SecureString::from("gem-key");

        let redacted = config.redact_secrets();
        assert_eq!(redacted.snipeit.api_token.expose_secret(), REDACTED);
        assert_eq!(redacted.gemini.api_key.expose_secret(), REDACTED);
        assert!(redacted.google.access_token.is_empty());

        let yaml = serde_yaml::to_string(&redacted).unwrap();
        assert!(!yaml.contains("snipe-token"));
        assert!(!yaml.contains("gem-key"));
    }

    #[test]
    fn test_parse_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
snipeit:
  endpoint_url: https://snipe.example.org/api/v1/
  api_token: from-file
google:
  devices_file: devices.json
retry:
  max_attempts: 3
  delay_secs: 1
sync:
  fieldset_id: 4
  model_match: exact
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.sync.fieldset_id, 4);
        assert_eq!(config.sync.default_model_id, 87);
        assert_eq!(config.google.devices_file, Some(PathBuf::from("devices.json")));

        let snipe = config.snipeit_config();
        assert_eq!(snipe.connector.base_url, "https://snipe.example.org/api/v1");
        assert_eq!(snipe.connector.max_attempts, 3);
        assert_eq!(snipe.connector.retry_delay_secs, 1);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_with_env(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.snipeit.search_limit, 50);
        assert_eq!(config.snipeit.requests_per_minute, 120);
    }

    #[test]
    fn test_gemini_uses_api_key_header() {
        let mut config = AppConfig::default();
        config.gemini.api_key = SecureString::from("gem-key");
        match config.gemini_config().connector.auth {
            AuthConfig::ApiKey { key, header_name } => {
                assert_eq!(key.expose_secret(), "gem-key");
                assert_eq!(header_name, "x-goog-api-key");
            }
            other => panic!("unexpected auth: {:?}", other),
        }
    }

    #[test]
    fn test_sync_settings_dry_run_flag() {
        let config = AppConfig::default();
        assert!(!config.sync_settings(false).dry_run);
        assert!(config.sync_settings(true).dry_run);
    }

    #[test]
    fn test_logging_config() {
        let mut config = AppConfig::default();
        config.logging.level = "ERROR".to_string();
        let logging = config.logging_config(false, false);
        assert_eq!(logging.level, Level::INFO);
        assert_eq!(logging.file_level, Level::ERROR);

        config.debug = true;
        assert_eq!(config.logging_config(false, false).level, Level::DEBUG);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("Critical"), Some(Level::ERROR));
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("loud"), None);
    }
}
