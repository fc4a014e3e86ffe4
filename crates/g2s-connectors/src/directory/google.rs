//! Google Admin SDK directory connector for ChromeOS devices.
//!
//! Lists `customer/{customer}/devices/chromeos`, following `nextPageToken`
//! until the last page. The access token is supplied by configuration.

use crate::http::HttpClient;
use crate::traits::{
    ConnectorConfig, ConnectorError, ConnectorHealth, ConnectorResult, DeviceRecord,
    DirectoryConnector,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Projections accepted by the ChromeOS devices API.
pub const PROJECTIONS: [&str; 2] = ["BASIC", "FULL"];

/// Google directory connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleDirectoryConfig {
    /// Base connector configuration (`base_url` is `https://admin.googleapis.com`).
    #[serde(flatten)]
    pub connector: ConnectorConfig,
    /// Customer identifier; `my_customer` is the caller's own account.
    #[serde(default = "default_customer_id")]
    pub customer_id: String,
    /// Devices requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Field projection (`BASIC` or `FULL`).
    #[serde(default = "default_projection")]
    pub projection: String,
}

/// Customer alias for the caller's own account.
pub fn default_customer_id() -> String {
    "my_customer".to_string()
}

/// Default page size.
pub fn default_page_size() -> u32 {
    300
}

/// Default projection.
pub fn default_projection() -> String {
    "FULL".to_string()
}

/// ChromeOS device listing from Google Workspace.
pub struct GoogleDirectoryConnector {
    config: GoogleDirectoryConfig,
    client: HttpClient,
}

impl GoogleDirectoryConnector {
    /// Creates a new directory connector.
    pub fn new(config: GoogleDirectoryConfig) -> ConnectorResult<Self> {
        if !PROJECTIONS.contains(&config.projection.as_str()) {
            return Err(ConnectorError::ConfigError(format!(
                "Unknown projection '{}', expected one of {:?}",
                config.projection, PROJECTIONS
            )));
        }
        let client = HttpClient::new(config.connector.clone())?;
        info!(
            customer = %config.customer_id,
            page_size = config.page_size,
            "Google directory connector initialized"
        );
        Ok(Self { config, client })
    }

    fn devices_path(&self) -> String {
        format!(
            "/admin/directory/v1/customer/{}/devices/chromeos",
            self.config.customer_id
        )
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> ConnectorResult<DevicePage> {
        let mut query = vec![
            ("maxResults", self.config.page_size.to_string()),
            ("projection", self.config.projection.clone()),
            ("orderBy", "lastSync".to_string()),
            ("sortOrder", "ASCENDING".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        let response = self.client.get(&self.devices_path(), &query).await?;
        HttpClient::read_json(response).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevicePage {
    #[serde(default)]
    chromeosdevices: Vec<ChromeOsDevice>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChromeOsDevice {
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    mac_address: Option<String>,
    #[serde(default)]
    last_known_network: Vec<KnownNetwork>,
    #[serde(default)]
    recent_users: Vec<RecentUser>,
    #[serde(default)]
    first_enrollment_time: Option<DateTime<Utc>>,
    /// int64 milliseconds, serialized by the API as a string.
    #[serde(default)]
    auto_update_expiration: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnownNetwork {
    #[serde(default)]
    ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentUser {
    #[serde(default)]
    email: Option<String>,
}

impl ChromeOsDevice {
    fn into_record(self) -> Option<DeviceRecord> {
        let serial = self.serial_number.filter(|s| !s.trim().is_empty())?;
        Some(DeviceRecord {
            serial,
            status: self.status,
            model: self.model,
            mac_address: self.mac_address,
            ip_address: self
                .last_known_network
                .into_iter()
                .find_map(|n| n.ip_address),
            last_user: self.recent_users.into_iter().find_map(|u| u.email),
            enrolled_at: self.first_enrollment_time,
            eol_date: self.auto_update_expiration.as_ref().and_then(epoch_millis_date),
        })
    }
}

fn epoch_millis_date(value: &Value) -> Option<NaiveDate> {
    let millis = match value {
        Value::String(s) => s.parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.date_naive())
}

#[async_trait]
impl crate::traits::Connector for GoogleDirectoryConnector {
    fn name(&self) -> &str {
        &self.config.connector.name
    }

    fn connector_type(&self) -> &str {
        "directory"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        let query = [("maxResults", "1".to_string())];
        match self.client.get(&self.devices_path(), &query).await {
            Ok(response) if response.status().is_success() => Ok(ConnectorHealth::Healthy),
            Ok(response) => Ok(ConnectorHealth::Unhealthy(format!(
                "HTTP {}",
                response.status()
            ))),
            Err(e) => Ok(ConnectorHealth::Unhealthy(e.to_string())),
        }
    }

    async fn test_connection(&self) -> ConnectorResult<bool> {
        Ok(matches!(self.health_check().await?, ConnectorHealth::Healthy))
    }
}

#[async_trait]
impl DirectoryConnector for GoogleDirectoryConnector {
    #[instrument(skip(self), fields(customer = %self.config.customer_id))]
    async fn list_devices(&self) -> ConnectorResult<Vec<DeviceRecord>> {
        let mut devices = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            pages += 1;

            for device in page.chromeosdevices {
                match device.into_record() {
                    Some(record) => devices.push(record),
                    None => warn!("Skipping directory entry without a serial number"),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(pages, devices = devices.len(), "Directory listing complete");
        Ok(devices)
    }
}
