//! Transfer engine
//!
//! Copies single files and whole directory trees between the local machine
//! and the remote side. Every read is followed by the matching write before
//! the next read is issued; there is no pipelining and no resume. A failed
//! file leaves whatever bytes were already written in place.
//!
//! Directory transfers walk the tree depth-first with one working cursor per
//! recursion frame. A failing entry is logged and recorded in the
//! [`TransferReport`] and its siblings still run.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::error::SftpError;
use super::listing::EntryList;
use super::progress::{NoOpObserver, ProgressObserver, ProgressThrottle};
use super::remote::RemoteFs;
use super::types::{
    constants, EntryKind, TransferDirection, TransferProgress, TransferReport,
};
use crate::path::{PathCursor, PathError};

/// Asked before a download replaces an existing local file.
#[async_trait]
pub trait OverwriteConfirm: Send + Sync {
    async fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Replace existing files without asking.
pub struct AlwaysOverwrite;

#[async_trait]
impl OverwriteConfirm for AlwaysOverwrite {
    async fn confirm_overwrite(&self, _path: &Path) -> bool {
        true
    }
}

/// Never replace existing files.
pub struct NeverOverwrite;

#[async_trait]
impl OverwriteConfirm for NeverOverwrite {
    async fn confirm_overwrite(&self, _path: &Path) -> bool {
        false
    }
}

/// Source and destination of one file copy, for errors and progress.
struct CopyJob<'a> {
    name: &'a str,
    source: &'a str,
    destination: &'a str,
    direction: TransferDirection,
    total_bytes: u64,
}

impl CopyJob<'_> {
    fn progress(&self, transferred_bytes: u64) -> TransferProgress {
        TransferProgress {
            name: self.name.to_string(),
            direction: self.direction,
            transferred_bytes,
            total_bytes: self.total_bytes,
        }
    }
}

pub struct TransferEngine {
    remote: Arc<dyn RemoteFs>,
    chunk_size: usize,
    progress_interval: Duration,
    progress: Arc<dyn ProgressObserver>,
    confirm: Arc<dyn OverwriteConfirm>,
}

impl TransferEngine {
    /// Engine with the default chunk size, no progress output and no
    /// overwriting of local files.
    pub fn new(remote: Arc<dyn RemoteFs>) -> Self {
        Self {
            remote,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            progress_interval: constants::PROGRESS_INTERVAL,
            progress: Arc::new(NoOpObserver),
            confirm: Arc::new(NeverOverwrite),
        }
    }

    /// Bytes moved per read/write pair, at least 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_overwrite_confirm(mut self, confirm: Arc<dyn OverwriteConfirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn remote(&self) -> &dyn RemoteFs {
        self.remote.as_ref()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Download the remote file at `source` into the local directory
    /// `destination_dir`, keeping its name. `size` is the expected length
    /// used for progress reports.
    ///
    /// Returns the number of bytes written.
    pub async fn download_file(
        &self,
        source: &PathCursor,
        destination_dir: &PathCursor,
        size: u64,
    ) -> Result<u64, SftpError> {
        let name = leaf_name(source)?;
        let destination = destination_dir.child(name)?;
        let local_path = destination.to_path_buf();
        info!("Downloading {} to {}", source, destination);

        let mut reader = self
            .remote
            .open_read(source.as_str())
            .await
            .map_err(|e| SftpError::Open {
                path: source.to_string(),
                source: e,
            })?;

        if tokio::fs::try_exists(&local_path).await.unwrap_or(false)
            && !self.confirm.confirm_overwrite(&local_path).await
        {
            info!("Keeping existing file {}", destination);
            return Err(SftpError::OverwriteDeclined {
                path: destination.to_string(),
            });
        }

        let mut writer = tokio::fs::File::create(&local_path)
            .await
            .map_err(|e| SftpError::Open {
                path: destination.to_string(),
                source: e,
            })?;

        let job = CopyJob {
            name,
            source: source.as_str(),
            destination: destination.as_str(),
            direction: TransferDirection::Download,
            total_bytes: size,
        };
        let transferred = self.copy_chunks(&job, &mut reader, &mut writer).await?;

        info!("Download complete: {} ({} bytes)", destination, transferred);
        Ok(transferred)
    }

    /// Upload the local file at `source` into the remote directory
    /// `destination_dir`. An existing remote file of the same name is never
    /// replaced.
    ///
    /// Returns the number of bytes written.
    pub async fn upload_file(
        &self,
        source: &PathCursor,
        destination_dir: &PathCursor,
    ) -> Result<u64, SftpError> {
        let name = leaf_name(source)?;
        let destination = destination_dir.child(name)?;
        info!("Uploading {} to {}", source, destination);

        let mut writer = self
            .remote
            .open_write(destination.as_str(), true)
            .await
            .map_err(|e| SftpError::Open {
                path: destination.to_string(),
                source: e,
            })?;

        let mut reader = tokio::fs::File::open(source.to_path_buf())
            .await
            .map_err(|e| SftpError::Open {
                path: source.to_string(),
                source: e,
            })?;
        let total_bytes = reader.metadata().await.map(|m| m.len()).unwrap_or(0);

        let job = CopyJob {
            name,
            source: source.as_str(),
            destination: destination.as_str(),
            direction: TransferDirection::Upload,
            total_bytes,
        };
        let transferred = self.copy_chunks(&job, &mut reader, &mut writer).await?;

        info!("Upload complete: {} ({} bytes)", destination, transferred);
        Ok(transferred)
    }

    /// Recursively download the remote directory `source_dir` into the local
    /// directory `destination_parent`.
    ///
    /// The top-level destination directory must not exist yet.
    pub async fn download_dir(
        &self,
        source_dir: &PathCursor,
        destination_parent: &PathCursor,
    ) -> Result<TransferReport, SftpError> {
        info!("Downloading directory {} to {}", source_dir, destination_parent);

        let mut report = TransferReport::default();
        self.download_dir_inner(source_dir, destination_parent, &mut report)
            .await?;

        info!(
            "Download directory complete: {} files, {} failed",
            report.files,
            report.failed.len()
        );
        Ok(report)
    }

    async fn download_dir_inner(
        &self,
        source_dir: &PathCursor,
        destination_parent: &PathCursor,
        report: &mut TransferReport,
    ) -> Result<(), SftpError> {
        let destination = destination_parent.child(leaf_name(source_dir)?)?;

        match tokio::fs::create_dir(destination.to_path_buf()).await {
            Ok(()) => report.directories += 1,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(SftpError::AlreadyExists {
                    path: destination.to_string(),
                });
            }
            Err(e) => {
                return Err(SftpError::Create {
                    path: destination.to_string(),
                    source: e,
                });
            }
        }

        let entries = match EntryList::list(self.remote.as_ref(), source_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                // The directory itself was created, its contents are lost
                warn!("{}, nothing copied into {}", e, destination);
                report.failed.push((source_dir.to_string(), e.to_string()));
                return Ok(());
            }
        };

        let mut working = source_dir.duplicate();
        for entry in &entries {
            if let Err(e) = working.descend(&entry.name) {
                warn!("Skipping entry {:?} of {}: {}", entry.name, source_dir, e);
                report.failed.push((entry.name.clone(), e.to_string()));
                continue;
            }

            let result = match entry.kind {
                EntryKind::Regular => self
                    .download_file(&working, &destination, entry.size)
                    .await
                    .map(|bytes| {
                        report.files += 1;
                        report.bytes += bytes;
                    }),
                EntryKind::Directory => {
                    Box::pin(self.download_dir_inner(&working, &destination, report)).await
                }
                kind => {
                    info!("Download of {} not supported ({}), skipping", working, kind);
                    report.skipped.push(working.to_string());
                    Ok(())
                }
            };

            if let Err(e) = result {
                warn!("Failed to download {}: {}", working, e);
                report.failed.push((working.to_string(), e.to_string()));
            }

            working.ascend()?;
        }

        Ok(())
    }

    /// Recursively upload the local directory `source_dir` into the remote
    /// directory `destination_parent`.
    pub async fn upload_dir(
        &self,
        source_dir: &PathCursor,
        destination_parent: &PathCursor,
    ) -> Result<TransferReport, SftpError> {
        info!("Uploading directory {} to {}", source_dir, destination_parent);

        let mut report = TransferReport::default();
        self.upload_dir_inner(source_dir, destination_parent, &mut report)
            .await?;

        info!(
            "Upload directory complete: {} files, {} failed",
            report.files,
            report.failed.len()
        );
        Ok(report)
    }

    async fn upload_dir_inner(
        &self,
        source_dir: &PathCursor,
        destination_parent: &PathCursor,
        report: &mut TransferReport,
    ) -> Result<(), SftpError> {
        let destination = destination_parent.child(leaf_name(source_dir)?)?;

        self.remote
            .create_dir(destination.as_str())
            .await
            .map_err(|e| SftpError::RemoteCreate {
                path: destination.to_string(),
                source: e,
            })?;
        report.directories += 1;

        let local_listing_error = |e: io::Error| SftpError::LocalListing {
            path: source_dir.to_string(),
            source: e,
        };

        let mut entries = tokio::fs::read_dir(source_dir.to_path_buf())
            .await
            .map_err(local_listing_error)?;

        let mut working = source_dir.duplicate();
        while let Some(entry) = entries.next_entry().await.map_err(local_listing_error)? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping non UTF-8 name {:?} in {}", raw, source_dir);
                    report.skipped.push(raw.to_string_lossy().into_owned());
                    continue;
                }
            };
            if name.starts_with(constants::HIDDEN_PREFIX) {
                continue;
            }

            if let Err(e) = working.descend(&name) {
                warn!("Skipping entry {:?} of {}: {}", name, source_dir, e);
                report.failed.push((name, e.to_string()));
                continue;
            }

            // Follows symlinks, a link to a directory is uploaded as one
            let result = match tokio::fs::metadata(entry.path()).await {
                Ok(meta) if meta.is_dir() => {
                    Box::pin(self.upload_dir_inner(&working, &destination, report)).await
                }
                Ok(meta) if meta.is_file() => self
                    .upload_file(&working, &destination)
                    .await
                    .map(|bytes| {
                        report.files += 1;
                        report.bytes += bytes;
                    }),
                Ok(_) => {
                    info!("Upload of {} not supported, skipping", working);
                    report.skipped.push(working.to_string());
                    Ok(())
                }
                Err(e) => Err(SftpError::Open {
                    path: working.to_string(),
                    source: e,
                }),
            };

            if let Err(e) = result {
                warn!("Failed to upload {}: {}", working, e);
                report.failed.push((working.to_string(), e.to_string()));
            }

            working.ascend()?;
        }

        Ok(())
    }

    /// Chunked copy loop shared by both directions.
    async fn copy_chunks<R, W>(
        &self,
        job: &CopyJob<'_>,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<u64, SftpError>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let write_error = |e: io::Error| SftpError::Write {
            path: job.destination.to_string(),
            source: e,
        };

        let mut buffer = vec![0u8; self.chunk_size];
        let mut transferred = 0u64;
        let mut throttle = ProgressThrottle::new(self.progress_interval);

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .await
                .map_err(|e| SftpError::Read {
                    path: job.source.to_string(),
                    source: e,
                })?;

            if bytes_read == 0 {
                break; // EOF
            }

            // A writer that accepts fewer bytes surfaces as WriteZero here
            writer
                .write_all(&buffer[..bytes_read])
                .await
                .map_err(write_error)?;

            transferred += bytes_read as u64;

            if throttle.ready() {
                self.progress.on_progress(&job.progress(transferred));
            }
        }

        writer.flush().await.map_err(write_error)?;
        // Closes the remote handle, a failed close fails the transfer
        writer.shutdown().await.map_err(write_error)?;
        debug!("Copied {} bytes from {}", transferred, job.source);

        let last = job.progress(transferred);
        self.progress.on_progress(&last);
        self.progress.on_finished(&last);

        Ok(transferred)
    }
}

fn leaf_name(cursor: &PathCursor) -> Result<&str, SftpError> {
    cursor
        .leaf_name()
        .ok_or_else(|| SftpError::Path(PathError::InvalidName(cursor.to_string())))
}
