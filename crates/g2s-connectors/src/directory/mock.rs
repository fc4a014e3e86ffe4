//! Mock directory connector for testing.

use crate::traits::{ConnectorHealth, ConnectorResult, DeviceRecord, DirectoryConnector};
use async_trait::async_trait;

/// Directory that returns a fixed device list.
pub struct MockDirectory {
    name: String,
    devices: Vec<DeviceRecord>,
}

impl MockDirectory {
    /// Creates a mock directory with `devices`.
    pub fn new(name: &str, devices: Vec<DeviceRecord>) -> Self {
        Self {
            name: name.to_string(),
            devices,
        }
    }
}

#[async_trait]
impl crate::traits::Connector for MockDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        "directory"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        Ok(ConnectorHealth::Healthy)
    }

    async fn test_connection(&self) -> ConnectorResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl DirectoryConnector for MockDirectory {
    async fn list_devices(&self) -> ConnectorResult<Vec<DeviceRecord>> {
        Ok(self.devices.clone())
    }
}
