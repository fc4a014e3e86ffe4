//! Device directory sources.

pub mod file;
pub mod google;
pub mod mock;

pub use file::FileDirectory;
pub use google::{GoogleDirectoryConfig, GoogleDirectoryConnector};
pub use mock::MockDirectory;
