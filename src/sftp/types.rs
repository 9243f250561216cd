//! SFTP data types

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Special,
    Unknown,
}

impl EntryKind {
    /// Classify from the `st_mode` bits reported by the server.
    pub fn from_mode(mode: Option<u32>) -> Self {
        const S_IFMT: u32 = 0o170000;

        match mode.map(|m| m & S_IFMT) {
            Some(0o100000) => EntryKind::Regular,
            Some(0o040000) => EntryKind::Directory,
            Some(0o120000) => EntryKind::Symlink,
            // socket, block device, character device, fifo
            Some(0o140000) | Some(0o060000) | Some(0o020000) | Some(0o010000) => {
                EntryKind::Special
            }
            _ => EntryKind::Unknown,
        }
    }

    /// Human readable name, used when an entry can't be transferred
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Regular => "regular",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symbolic link",
            EntryKind::Special => "special",
            EntryKind::Unknown => "unknown",
        }
    }

    /// ANSI color code for listings
    pub fn color(&self) -> &'static str {
        match self {
            EntryKind::Regular => "0;37",
            EntryKind::Directory => "0;34",
            EntryKind::Symlink => "0;36",
            EntryKind::Special => "0;32",
            EntryKind::Unknown => "0;31",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// File name (not full path)
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes, 0 when the server doesn't report one
    pub size: u64,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, size: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with(constants::HIDDEN_PREFIX)
    }
}

/// Transfer progress information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProgress {
    /// Leaf name of the file being copied
    pub name: String,
    pub direction: TransferDirection,
    /// Bytes transferred so far
    pub transferred_bytes: u64,
    /// Expected size, 0 if unknown
    pub total_bytes: u64,
}

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Outcome of a recursive transfer
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    /// Files copied completely
    pub files: u64,
    /// Directories created
    pub directories: u64,
    /// Bytes copied across all files
    pub bytes: u64,
    /// Entries that were not attempted (unsupported kind)
    pub skipped: Vec<String>,
    /// Failed paths with error messages
    pub failed: Vec<(String, String)>,
}

impl TransferReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Constants for SFTP operations
pub mod constants {
    use std::time::Duration;

    /// Default chunk size for file transfers (32 KB)
    pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

    /// Minimum time between two progress reports of the same file
    pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

    /// Entries whose name starts with this are never listed or transferred
    pub const HIDDEN_PREFIX: char = '.';
}

/// Format a byte count as `512B`, `1.500KB`, `2.000MB`, `1.250GB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = bytes as f64;
    if size < KB {
        format!("{}B", bytes)
    } else if size < MB {
        format!("{:.3}KB", size / KB)
    } else if size < GB {
        format!("{:.3}MB", size / MB)
    } else {
        format!("{:.3}GB", size / GB)
    }
}
