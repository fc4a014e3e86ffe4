//! Asset-management connectors.

pub mod client;
pub mod mock;

pub use client::{SnipeItConfig, SnipeItConnector};
pub use mock::{MockAssetManagement, RecordedCall};
