//! Growable text buffer
//!
//! Every growth goes through `try_reserve`, so running out of memory is
//! reported as [`BufferError::Allocation`] instead of aborting the process.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("Failed to allocate buffer storage: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("Invalid index {index}, should be in range 0-{max}")]
    Range { index: usize, max: usize },
}

/// Owned, resizable string with fallible growth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    contents: String,
}

impl TextBuffer {
    /// Create a buffer holding a copy of `seed`.
    pub fn new(seed: &str) -> Result<Self, BufferError> {
        let mut contents = String::new();
        contents.try_reserve_exact(seed.len())?;
        contents.push_str(seed);
        Ok(Self { contents })
    }

    /// Reserve room for `additional` more bytes so that the following appends
    /// cannot fail halfway.
    pub fn reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        self.contents.try_reserve(additional)?;
        Ok(())
    }

    /// Append `suffix`, keeping the existing contents.
    pub fn append(&mut self, suffix: &str) -> Result<(), BufferError> {
        self.contents.try_reserve(suffix.len())?;
        self.contents.push_str(suffix);
        Ok(())
    }

    /// Discard the current contents and store a copy of `new_contents`.
    ///
    /// The old contents stay in place if the new storage cannot be obtained.
    pub fn replace(&mut self, new_contents: &str) -> Result<(), BufferError> {
        let mut contents = String::new();
        contents.try_reserve_exact(new_contents.len())?;
        contents.push_str(new_contents);
        self.contents = contents;
        Ok(())
    }

    /// Keep only the bytes before `index` and shrink the allocation.
    ///
    /// `index` is the position where the terminator ends up, so the valid
    /// range is `0..=len()`.
    pub fn truncate_after(&mut self, index: usize) -> Result<(), BufferError> {
        let max = self.size() - 1;
        if index > max || !self.contents.is_char_boundary(index) {
            return Err(BufferError::Range { index, max });
        }

        self.contents.truncate(index);
        self.contents.shrink_to_fit();
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Length including the terminator slot.
    pub fn size(&self) -> usize {
        self.contents.len() + 1
    }
}

impl AsRef<str> for TextBuffer {
    fn as_ref(&self) -> &str {
        &self.contents
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents)
    }
}
