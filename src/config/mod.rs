//! Configuration Management Module
//!
//! Persistent settings for the SFTP browser: connection target,
//! authentication and transfer defaults.

pub mod storage;
pub mod types;

pub use storage::{config_file, ConfigStorage, StorageError};
pub use types::{default_download_directory, AppConfig, SavedAuth, CONFIG_VERSION};
