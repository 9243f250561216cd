//! Connection setup and the interactive session

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::config::{AppConfig, ConfigStorage, SavedAuth, StorageError};
use crate::navigator::{home_menu, resolve_local, Console, ConsoleConfirm, Navigator};
use crate::path::{PathCursor, PathError, Platform};
use crate::sftp::{ConsoleProgress, RemoteFs, SftpError, TransferEngine};
use crate::ssh::{AuthMethod, SshClient, SshConfig, SshError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] StorageError),

    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error(transparent)]
    Sftp(#[from] SftpError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("No host to connect to")]
    NoHost,

    #[error("Failed to read password: {0}")]
    Password(#[source] std::io::Error),
}

/// Load the config file, writing the defaults on first run so there is
/// something to edit.
pub async fn load_config() -> Result<AppConfig, AppError> {
    let storage = ConfigStorage::new()?;
    let config = storage.load().await?;

    if !storage.exists().await {
        match storage.save(&config).await {
            Ok(()) => info!("Wrote default config to {:?}", storage.path()),
            Err(e) => warn!("Failed to write default config: {}", e),
        }
    }

    Ok(config)
}

async fn ssh_config(config: &AppConfig, console: &dyn Console) -> Result<SshConfig, AppError> {
    let host = match config.host.clone() {
        Some(host) => host,
        None => console
            .prompt("Host: ")
            .await
            .map(|line| line.trim().to_string())
            .filter(|host| !host.is_empty())
            .ok_or(AppError::NoHost)?,
    };

    let auth = match &config.auth {
        SavedAuth::Password => {
            let prompt = format!("{}@{}'s password: ", config.username, host);
            let password =
                Zeroizing::new(rpassword::prompt_password(prompt).map_err(AppError::Password)?);
            AuthMethod::Password { password }
        }
        SavedAuth::Key {
            key_path,
            passphrase,
        } => AuthMethod::key(key_path.clone(), passphrase.clone()),
    };

    Ok(SshConfig {
        host,
        port: config.port,
        username: config.username.clone(),
        auth,
        timeout_secs: config.timeout_secs,
        strict_host_key_checking: config.strict_host_key_checking,
    })
}

/// Connect, open SFTP and run the home menu until the user quits.
pub async fn run_session(config: AppConfig, console: Arc<dyn Console>) -> Result<(), AppError> {
    let ssh_config = ssh_config(&config, console.as_ref()).await?;
    let connection = SshClient::new(ssh_config).connect().await?;
    let sftp = Arc::new(connection.open_sftp().await?);

    let start = match &config.initial_directory {
        Some(dir) => sftp.canonicalize(dir).await.map_err(|e| SftpError::Open {
            path: dir.clone(),
            source: e,
        })?,
        None => sftp.home_dir().await?,
    };
    let start = PathCursor::new(&start, Platform::Unix)?;
    let download_dir =
        resolve_local(&config.default_download_directory.to_string_lossy())?;
    info!("Starting at {}, downloads go to {}", start, download_dir);

    let engine = TransferEngine::new(sftp.clone())
        .with_chunk_size(config.effective_chunk_size())
        .with_progress(Arc::new(ConsoleProgress::new()))
        .with_overwrite_confirm(Arc::new(ConsoleConfirm::new(console.clone())));

    let mut navigator = Navigator::new(engine, console.clone(), start, download_dir);
    home_menu(&mut navigator, console.as_ref()).await;

    if let Err(e) = sftp.close().await {
        warn!("Failed to close SFTP session: {}", e);
    }
    if let Err(e) = connection.disconnect().await {
        warn!("Failed to disconnect: {}", e);
    }

    Ok(())
}
