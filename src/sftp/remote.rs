//! Remote filesystem capability
//!
//! The transfer engine and the navigator only need four primitive operations
//! from the remote side. [`SftpSession`](super::SftpSession) provides them
//! over russh-sftp; tests use an in-memory fake.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::types::RemoteEntry;

/// Sequential reader over a remote file
pub type RemoteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Sequential writer over a remote file
pub type RemoteWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// Full listing of `path`, `.` and `..` excluded.
    ///
    /// An enumeration that stops before the end of the directory is an
    /// error, never a shorter listing.
    async fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>>;

    async fn open_read(&self, path: &str) -> io::Result<RemoteReader>;

    /// Open `path` for writing, creating it. With `exclusive` an existing
    /// file is an error, otherwise it is truncated.
    async fn open_write(&self, path: &str, exclusive: bool) -> io::Result<RemoteWriter>;

    async fn create_dir(&self, path: &str) -> io::Result<()>;

    /// Resolve `path` to an absolute path on the server.
    async fn canonicalize(&self, path: &str) -> io::Result<String>;
}
