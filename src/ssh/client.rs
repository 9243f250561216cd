//! SSH Client implementation using russh

use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{HashAlg, PublicKey};
use russh::*;
use tracing::{debug, info, warn};

use super::config::{AuthMethod, SshConfig};
use super::error::SshError;
use crate::sftp::{SftpError, SftpSession};

/// SSH Client handler for russh
pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Connect to the SSH server and authenticate
    pub async fn connect(self) -> Result<SshConnection, SshError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!("Connecting to SSH server at {}", addr);

        // Resolve address
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let ssh_config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        };

        let handler = ClientHandler::new(
            self.config.host.clone(),
            self.config.port,
            self.config.strict_host_key_checking,
        );

        // Connect with timeout
        let mut handle = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            client::connect(Arc::new(ssh_config), socket_addr, handler),
        )
        .await
        .map_err(|_| SshError::Timeout("Connection timed out".to_string()))?
        .map_err(|e| match e {
            rejected @ SshError::HostKeyRejected(_) => rejected,
            other => SshError::ConnectionFailed(other.to_string()),
        })?;

        debug!("SSH handshake completed");

        let authenticated = match &self.config.auth {
            AuthMethod::Password { password } => handle
                .authenticate_password(&self.config.username, password.as_str())
                .await
                .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?,
            AuthMethod::Key {
                key_path,
                passphrase,
            } => {
                let key = russh::keys::load_secret_key(
                    key_path,
                    passphrase.as_ref().map(|p| p.as_str()),
                )
                .map_err(|e| SshError::KeyError(e.to_string()))?;

                let key_with_hash = PrivateKeyWithHashAlg::new(Arc::new(key), None);

                handle
                    .authenticate_publickey(&self.config.username, key_with_hash)
                    .await
                    .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?
            }
        };

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful");

        Ok(SshConnection { handle })
    }
}

/// Authenticated SSH connection
pub struct SshConnection {
    handle: client::Handle<ClientHandler>,
}

impl SshConnection {
    /// Open a session channel and start the SFTP subsystem on it.
    pub async fn open_sftp(&self) -> Result<SftpSession, SftpError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SftpError::Session(format!("Failed to open channel: {}", e)))?;

        SftpSession::open(channel).await
    }

    pub async fn disconnect(&self) -> Result<(), SshError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        Ok(())
    }
}

/// Client handler for russh callbacks
///
/// Verifies the server key against ~/.ssh/known_hosts.
pub struct ClientHandler {
    /// Target host for key verification
    host: String,
    /// Target port
    port: u16,
    /// Strict host key checking mode
    /// - true: reject unknown/changed keys
    /// - false: accept and learn unknown keys (still reject changed)
    strict: bool,
    /// known_hosts file, `None` for the user's default one
    known_hosts: Option<PathBuf>,
}

impl ClientHandler {
    pub fn new(host: String, port: u16, strict: bool) -> Self {
        Self {
            host,
            port,
            strict,
            known_hosts: None,
        }
    }

    pub fn with_known_hosts(mut self, path: PathBuf) -> Self {
        self.known_hosts = Some(path);
        self
    }

    fn check_known(&self, key: &PublicKey) -> Result<bool, russh::keys::Error> {
        match &self.known_hosts {
            Some(path) => check_known_hosts_path(&self.host, self.port, key, path),
            None => check_known_hosts(&self.host, self.port, key),
        }
    }

    fn learn(&self, key: &PublicKey) -> Result<(), russh::keys::Error> {
        match &self.known_hosts {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256);

        match self.check_known(server_public_key) {
            Ok(true) => {
                info!("Host key verified for {}:{}", self.host, self.port);
                Ok(true)
            }
            Err(russh::keys::Error::KeyChanged { line }) => {
                // ALWAYS reject changed keys - potential MITM attack
                warn!(
                    "HOST KEY CHANGED for {}:{}! known_hosts line {}, got {}",
                    self.host, self.port, line, fingerprint
                );
                Err(SshError::HostKeyRejected(format!(
                    "Key for {}:{} has changed (known_hosts line {}). Got {}. \
                     If the change is legitimate, remove the old entry from ~/.ssh/known_hosts",
                    self.host, self.port, line, fingerprint
                )))
            }
            other => {
                if let Err(e) = other {
                    warn!("Failed to read known_hosts: {}", e);
                }

                if self.strict {
                    warn!(
                        "Unknown host key for {}:{} (fingerprint: {}). Strict mode enabled, rejecting.",
                        self.host, self.port, fingerprint
                    );
                    return Err(SshError::HostKeyRejected(format!(
                        "Unknown host {}:{}. Fingerprint: {}. \
                         Add to known_hosts or disable strict mode.",
                        self.host, self.port, fingerprint
                    )));
                }

                info!(
                    "New host {}:{}, adding to known_hosts (fingerprint: {})",
                    self.host, self.port, fingerprint
                );
                if let Err(e) = self.learn(server_public_key) {
                    warn!("Failed to save host key: {}", e);
                }
                Ok(true)
            }
        }
    }
}
