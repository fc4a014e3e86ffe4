//! Testing harness for connector implementations.
//!
//! Provides helper functions shared by unit tests, integration tests and the
//! core crate's tests.

use crate::traits::{AuthConfig, ConnectorConfig, ConnectorHealth, ConnectorResult, DeviceRecord};
use std::collections::HashMap;

/// Creates a test connector config: no auth, one attempt, no retry delay.
pub fn test_connector_config(name: &str, base_url: &str) -> ConnectorConfig {
    ConnectorConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        auth: AuthConfig::None,
        timeout_secs: 30,
        max_attempts: 1,
        retry_delay_secs: 0,
        verify_tls: true,
        headers: HashMap::new(),
    }
}

/// Creates a test connector config with bearer token auth.
pub fn test_connector_config_with_bearer(
    name: &str,
    base_url: &str,
    token: &str,
) -> ConnectorConfig {
    ConnectorConfig {
        auth: AuthConfig::BearerToken {
            token: crate::SecureString::new(token.to_string()),
        },
        ..test_connector_config(name, base_url)
    }
}

/// Creates a fully populated sample device.
pub fn sample_device(serial: &str, model: &str) -> DeviceRecord {
    DeviceRecord {
        serial: serial.to_string(),
        status: Some("ACTIVE".to_string()),
        model: Some(model.to_string()),
        mac_address: Some("a81d166742f7".to_string()),
        ip_address: Some("10.0.0.12".to_string()),
        last_user: Some("student@example.org".to_string()),
        enrolled_at: None,
        eol_date: None,
    }
}

/// Asserts that a connector health check returns healthy.
pub fn assert_healthy(result: &ConnectorResult<ConnectorHealth>) {
    match result {
        Ok(ConnectorHealth::Healthy) => {}
        other => panic!("Expected Healthy, got {:?}", other),
    }
}

/// Asserts that a connector health check returns unhealthy.
pub fn assert_unhealthy(result: &ConnectorResult<ConnectorHealth>) {
    match result {
        Ok(ConnectorHealth::Unhealthy(_)) => {}
        other => panic!("Expected Unhealthy, got {:?}", other),
    }
}
