//! Configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sftp::constants::DEFAULT_CHUNK_SIZE;

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Authentication as stored on disk. Passwords are never persisted, they
/// are asked for at connect time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SavedAuth {
    #[default]
    Password,
    Key {
        key_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        passphrase: Option<String>,
    },
}

/// Contents of `config.json`
///
/// Every field has a default so a partial file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Server to connect to, asked for when missing
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub auth: SavedAuth,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub strict_host_key_checking: bool,

    /// Remote directory navigation starts in, the login directory if unset
    #[serde(default)]
    pub initial_directory: Option<String>,

    /// Local directory downloads from navigate mode are written to
    #[serde(default = "default_download_directory")]
    pub default_download_directory: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl AppConfig {
    /// Transfer chunk size, never 0
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_port() -> u16 {
    22
}

fn default_username() -> String {
    whoami::username()
}

fn default_timeout() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// `~/Downloads` or the platform equivalent
pub fn default_download_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: None,
            port: default_port(),
            username: default_username(),
            auth: SavedAuth::default(),
            timeout_secs: default_timeout(),
            strict_host_key_checking: false,
            initial_directory: None,
            default_download_directory: default_download_directory(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"host": "files.example.com", "port": 2222}"#).unwrap();

        assert_eq!(config.host.as_deref(), Some("files.example.com"));
        assert_eq!(config.port, 2222);
        assert_eq!(config.auth, SavedAuth::Password);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.chunk_size, 32 * 1024);
        assert!(config.initial_directory.is_none());
    }

    #[test]
    fn test_key_auth() {
        let config: AppConfig = serde_json::from_str(
            r#"{"auth": {"type": "key", "key_path": "/home/me/.ssh/id_ed25519"}}"#,
        )
        .unwrap();

        assert_eq!(
            config.auth,
            SavedAuth::Key {
                key_path: "/home/me/.ssh/id_ed25519".into(),
                passphrase: None
            }
        );
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let config: AppConfig = serde_json::from_str(r#"{"chunk_size": 0}"#).unwrap();
        assert_eq!(config.effective_chunk_size(), 1);
    }
}
