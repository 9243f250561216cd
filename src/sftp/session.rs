//! SFTP Session
//!
//! Remote filesystem operations over an SSH channel running the `sftp`
//! subsystem.

use std::io;

use async_trait::async_trait;
use russh::client::Msg;
use russh::Channel;
use russh_sftp::client::error::Error as SftpErrorInner;
use russh_sftp::client::SftpSession as RusshSftpSession;
use russh_sftp::protocol::OpenFlags;
use tracing::{debug, info};

use super::error::SftpError;
use super::remote::{RemoteFs, RemoteReader, RemoteWriter};
use super::types::{EntryKind, RemoteEntry};

/// SFTP Session wrapper
pub struct SftpSession {
    sftp: RusshSftpSession,
}

impl SftpSession {
    /// Start the SFTP subsystem on a freshly opened session channel.
    pub async fn open(channel: Channel<Msg>) -> Result<Self, SftpError> {
        channel.request_subsystem(true, "sftp").await.map_err(|e| {
            SftpError::SubsystemNotAvailable(format!("Failed to request SFTP subsystem: {}", e))
        })?;

        let sftp = RusshSftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SftpError::SubsystemNotAvailable(e.to_string()))?;

        info!("SFTP subsystem opened");
        Ok(Self { sftp })
    }

    /// Absolute path of the login directory.
    pub async fn home_dir(&self) -> Result<String, SftpError> {
        self.sftp
            .canonicalize(".")
            .await
            .map_err(|e| SftpError::Session(e.to_string()))
    }

    pub async fn close(&self) -> Result<(), SftpError> {
        self.sftp
            .close()
            .await
            .map_err(|e| SftpError::Session(e.to_string()))
    }
}

/// Map SFTP errors to I/O errors, keeping the kinds callers branch on
fn map_sftp_error(err: SftpErrorInner, path: &str) -> io::Error {
    let err_str = err.to_string();
    let kind = if err_str.contains("No such file") || err_str.contains("not found") {
        io::ErrorKind::NotFound
    } else if err_str.contains("Permission denied") {
        io::ErrorKind::PermissionDenied
    } else if err_str.contains("exists") {
        io::ErrorKind::AlreadyExists
    } else {
        io::ErrorKind::Other
    };
    io::Error::new(kind, format!("{}: {}", path, err_str))
}

#[async_trait]
impl RemoteFs for SftpSession {
    async fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        // russh-sftp reads until the server reports EOF, any other status
        // fails the whole call
        let read_dir = self
            .sftp
            .read_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;

        let entries: Vec<RemoteEntry> = read_dir
            .into_iter()
            .filter(|entry| {
                let name = entry.file_name();
                name != "." && name != ".."
            })
            .map(|entry| {
                let metadata = entry.metadata();
                RemoteEntry {
                    name: entry.file_name(),
                    kind: EntryKind::from_mode(metadata.permissions),
                    size: metadata.size.unwrap_or(0),
                }
            })
            .collect();

        debug!("read_dir {}: {} entries", path, entries.len());
        Ok(entries)
    }

    async fn open_read(&self, path: &str) -> io::Result<RemoteReader> {
        let file = self
            .sftp
            .open(path)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(Box::new(file))
    }

    async fn open_write(&self, path: &str, exclusive: bool) -> io::Result<RemoteWriter> {
        let existing = if exclusive {
            OpenFlags::EXCLUDE
        } else {
            OpenFlags::TRUNCATE
        };
        let flags = OpenFlags::CREATE | OpenFlags::WRITE | existing;

        let file = self
            .sftp
            .open_with_flags(path, flags)
            .await
            .map_err(|e| map_sftp_error(e, path))?;
        Ok(Box::new(file))
    }

    async fn create_dir(&self, path: &str) -> io::Result<()> {
        self.sftp
            .create_dir(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }

    async fn canonicalize(&self, path: &str) -> io::Result<String> {
        self.sftp
            .canonicalize(path)
            .await
            .map_err(|e| map_sftp_error(e, path))
    }
}
