//! Virtual path cursor
//!
//! Remote SFTP paths always use `/`. Local paths use the separator of the
//! platform the cursor was created for, so one type walks both sides of a
//! transfer.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::buffer::{BufferError, TextBuffer};

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path cannot be empty")]
    Empty,

    #[error("Path is not absolute: {0}")]
    NotAbsolute(String),

    #[error("Invalid path component: {0:?}")]
    InvalidName(String),

    #[error("Cannot move to before the root directory")]
    AtRoot,

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Path flavour, selects the separator character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// Platform of the machine we are running on.
    pub fn local() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    pub const fn separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            Platform::Unix => '/',
        }
    }

    /// Length of the root prefix of `path`, or `None` if it is not absolute.
    ///
    /// - Unix: `/`
    /// - Windows: `C:\` or a bare `\` (UNC shares are not supported)
    fn root_len(self, path: &str) -> Option<usize> {
        match self {
            Platform::Unix => path.starts_with('/').then_some(1),
            Platform::Windows => {
                let bytes = path.as_bytes();
                if bytes.len() >= 3
                    && bytes[0].is_ascii_alphabetic()
                    && bytes[1] == b':'
                    && bytes[2] == b'\\'
                {
                    Some(3)
                } else if path.starts_with('\\') && !path.starts_with("\\\\") {
                    Some(1)
                } else {
                    None
                }
            }
        }
    }
}

/// Absolute path held in a single growable buffer.
///
/// Cloning gives an independent cursor; nothing is shared between copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCursor {
    buf: TextBuffer,
    platform: Platform,
    root_len: usize,
}

impl PathCursor {
    /// Create a cursor over a copy of `seed`.
    ///
    /// Trailing separators are dropped (except for the root itself). On
    /// Windows, `/` in the seed is converted to `\`.
    pub fn new(seed: &str, platform: Platform) -> Result<Self, PathError> {
        if seed.is_empty() {
            return Err(PathError::Empty);
        }

        let normalized = match platform {
            Platform::Windows => seed.replace('/', "\\"),
            Platform::Unix => seed.to_string(),
        };

        let root_len = platform
            .root_len(&normalized)
            .ok_or_else(|| PathError::NotAbsolute(seed.to_string()))?;

        let sep = platform.separator();
        let trimmed = normalized.trim_end_matches(sep);
        let end = trimmed.len().max(root_len);

        Ok(Self {
            buf: TextBuffer::new(&normalized[..end])?,
            platform,
            root_len,
        })
    }

    /// Root cursor for `platform` (`/` or `\`).
    pub fn root(platform: Platform) -> Result<Self, PathError> {
        Self::new(&platform.separator().to_string(), platform)
    }

    /// Independent deep copy.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_root(&self) -> bool {
        self.buf.len() == self.root_len
    }

    /// Move into the child `name`.
    pub fn descend(&mut self, name: &str) -> Result<(), PathError> {
        let sep = self.platform.separator();
        // `/` is a separator on every platform
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', sep]) {
            return Err(PathError::InvalidName(name.to_string()));
        }

        let at_root = self.is_root();
        self.buf
            .reserve(name.len() + if at_root { 0 } else { sep.len_utf8() })?;

        if !at_root {
            let mut tmp = [0u8; 4];
            self.buf.append(sep.encode_utf8(&mut tmp))?;
        }
        self.buf.append(name)?;

        Ok(())
    }

    /// Move to the parent directory.
    ///
    /// Collapses to the root but never past it; ascending from the root is
    /// an error and leaves the cursor untouched.
    pub fn ascend(&mut self) -> Result<(), PathError> {
        if self.is_root() {
            return Err(PathError::AtRoot);
        }

        let sep = self.platform.separator();
        let cut = match self.as_str().rfind(sep) {
            Some(idx) if idx >= self.root_len => idx,
            _ => self.root_len,
        };

        self.buf.truncate_after(cut)?;
        Ok(())
    }

    /// Final path component, `None` at the root.
    pub fn leaf_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }

        let path = self.as_str();
        let start = path
            .rfind(self.platform.separator())
            .map(|idx| idx + 1)
            .unwrap_or(0)
            .max(self.root_len);
        Some(&path[start..])
    }

    /// Copy of this cursor descended into `name`.
    pub fn child(&self, name: &str) -> Result<Self, PathError> {
        let mut child = self.clone();
        child.descend(name)?;
        Ok(child)
    }

    /// Local filesystem view of the cursor.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.as_str())
    }
}

impl fmt::Display for PathCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
