//! Path handling for remote and local trees
//!
//! A [`PathCursor`] holds one absolute path in a [`TextBuffer`] and is walked
//! depth-first by the transfer engine: descend before recursing, ascend on the
//! way back out.

mod buffer;
mod cursor;

pub use buffer::{BufferError, TextBuffer};
pub use cursor::{PathCursor, PathError, Platform};
