//! Directory entry collection

use std::fmt::Write as _;

use tracing::debug;

use super::error::SftpError;
use super::remote::RemoteFs;
use super::types::RemoteEntry;
use crate::path::PathCursor;

/// Listing of one remote directory, hidden entries removed.
///
/// Order is the order the server returned. Positions shown to the user are
/// 1-based; 0 is reserved for "previous directory".
#[derive(Debug, Clone, Default)]
pub struct EntryList {
    entries: Vec<RemoteEntry>,
}

impl EntryList {
    pub fn from_entries(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        Self {
            entries: entries.into_iter().filter(|e| !e.is_hidden()).collect(),
        }
    }

    /// List the directory the cursor points at.
    pub async fn list(remote: &dyn RemoteFs, cursor: &PathCursor) -> Result<Self, SftpError> {
        debug!("Listing directory: {}", cursor);

        let raw = remote
            .read_dir(cursor.as_str())
            .await
            .map_err(|e| SftpError::Listing {
                path: cursor.to_string(),
                source: e,
            })?;

        let list = Self::from_entries(raw);
        debug!("Listed {} entries in {}", list.len(), cursor);
        Ok(list)
    }

    /// Entry at 1-based `index`.
    pub fn get(&self, index: usize) -> Result<&RemoteEntry, SftpError> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(SftpError::Range {
                index,
                len: self.entries.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RemoteEntry> {
        self.entries.iter()
    }

    /// Numbered, colored menu of the listing.
    pub fn render(&self) -> String {
        let mut out = String::from("0. (previous directory)\n");
        for (i, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. \x1b[{}m{}\x1b[0m",
                i + 1,
                entry.kind.color(),
                entry.name
            );
        }
        out
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a RemoteEntry;
    type IntoIter = std::slice::Iter<'a, RemoteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
