//! Directory source backed by a JSON export file.

use crate::traits::{
    ConnectorError, ConnectorHealth, ConnectorResult, DeviceRecord, DirectoryConnector,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Reads a JSON array of device records from disk.
pub struct FileDirectory {
    name: String,
    path: PathBuf,
}

impl FileDirectory {
    /// Creates a file-backed source.
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
        }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl crate::traits::Connector for FileDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        "directory"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(ConnectorHealth::Healthy),
            Ok(_) => Ok(ConnectorHealth::Unhealthy(format!(
                "{} is not a file",
                self.path.display()
            ))),
            Err(e) => Ok(ConnectorHealth::Unhealthy(e.to_string())),
        }
    }

    async fn test_connection(&self) -> ConnectorResult<bool> {
        Ok(matches!(self.health_check().await?, ConnectorHealth::Healthy))
    }
}

#[async_trait]
impl DirectoryConnector for FileDirectory {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn list_devices(&self) -> ConnectorResult<Vec<DeviceRecord>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ConnectorError::ConfigError(format!(
                "Failed to read devices file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let devices: Vec<DeviceRecord> = serde_json::from_str(&content).map_err(|e| {
            ConnectorError::InvalidResponse(format!(
                "Failed to parse devices file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(devices = devices.len(), "Loaded devices from file");
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Connector;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reads_device_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"serial":"SN001","status":"ACTIVE","model":"Widget X","mac_address":"a81d166742f7"}},
                {{"serial":"SN002","enrolled_at":"2024-01-05T10:00:00Z"}}]"#
        )
        .unwrap();

        let source = FileDirectory::new("file", file.path());
        let devices = source.list_devices().await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].model.as_deref(), Some("Widget X"));
        assert!(devices[1].enrolled_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = FileDirectory::new("file", "/nonexistent/devices.json");
        assert!(matches!(
            source.list_devices().await,
            Err(ConnectorError::ConfigError(_))
        ));
        assert!(matches!(
            source.health_check().await,
            Ok(ConnectorHealth::Unhealthy(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let source = FileDirectory::new("file", file.path());
        assert!(matches!(
            source.list_devices().await,
            Err(ConnectorError::InvalidResponse(_))
        ));
    }
}
