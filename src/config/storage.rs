//! Config file on disk
//!
//! Lives at `~/.sftpnav/config.json`, or `%APPDATA%\SftpNav\config.json` on
//! Windows.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;
use tracing::{error, warn};

use super::types::{AppConfig, CONFIG_VERSION};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

/// Default location of the config file.
pub fn config_file() -> Result<PathBuf, StorageError> {
    #[cfg(windows)]
    let dir = dirs::config_dir().map(|dir| dir.join("SftpNav"));
    #[cfg(not(windows))]
    let dir = dirs::home_dir().map(|home| home.join(".sftpnav"));

    dir.map(|dir| dir.join("config.json"))
        .ok_or(StorageError::NoConfigDir)
}

pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self::with_path(config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read the config.
    ///
    /// A missing file yields the defaults. So does a file that doesn't
    /// parse, after it has been renamed out of the way.
    pub async fn load(&self) -> Result<AppConfig, StorageError> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AppConfig::default())
            }
            Err(e) => return Err(e.into()),
        };

        let config: AppConfig = match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(parse_err) => {
                match self.set_aside().await {
                    Ok(moved) => warn!(
                        "Unreadable config ({}), moved to {:?}, using defaults",
                        parse_err, moved
                    ),
                    Err(e) => error!(
                        "Unreadable config ({}) could not be moved: {}",
                        parse_err, e
                    ),
                }
                return Ok(AppConfig::default());
            }
        };

        if config.version > CONFIG_VERSION {
            return Err(StorageError::VersionTooNew {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// Write the config through a staging file so a crash never leaves a
    /// half-written one behind.
    pub async fn save(&self, config: &AppConfig) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(config)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn set_aside(&self) -> Result<PathBuf, StorageError> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let target = self.path.with_extension(format!("json.broken.{}", stamp));
        fs::rename(&self.path, &target).await?;
        Ok(target)
    }
}
