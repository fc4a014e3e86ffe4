//! # g2s-connectors
//!
//! Outbound integrations for google2snipe: the Snipe-IT asset-management API,
//! the Gemini classification API and the device directory sources.
//!
//! This crate provides the trait definitions the reconciliation core depends
//! on, the HTTP executor with bounded retry, and mock implementations for tests.

pub mod classifier;
pub mod directory;
pub mod http;
pub mod secure_string;
pub mod snipeit;
pub mod testing;
pub mod traits;

pub use secure_string::SecureString;

// Re-export traits
pub use traits::{
    // Asset management
    AssetManagementConnector,
    AuthConfig,
    // Classification
    ClassifierConnector,
    Connector,
    ConnectorConfig,
    ConnectorError,
    ConnectorHealth,
    ConnectorResult,
    CreateModelRequest,
    // Directory
    DeviceRecord,
    DirectoryConnector,
    HardwarePayload,
    HardwareRow,
    MutationEnvelope,
    MutationResponse,
    ReferenceRow,
    RowsEnvelope,
};

pub use http::{HttpClient, RateLimitConfig, RetryPolicy};

// Re-export connector implementations
pub use classifier::{GeminiConfig, GeminiConnector, MockClassifier};
pub use directory::{
    FileDirectory, GoogleDirectoryConfig, GoogleDirectoryConnector, MockDirectory,
};
pub use snipeit::{MockAssetManagement, RecordedCall, SnipeItConfig, SnipeItConnector};
