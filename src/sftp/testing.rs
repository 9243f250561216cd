//! In-memory remote filesystem for tests

use std::collections::HashSet;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::remote::{RemoteFs, RemoteReader, RemoteWriter};
use super::types::{EntryKind, RemoteEntry};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
    Other(EntryKind),
}

#[derive(Default)]
struct Faults {
    listing: HashSet<String>,
    reads: HashSet<String>,
    writes: HashSet<String>,
    closes: HashSet<String>,
}

/// Nodes keyed by absolute path, kept in creation order so listings come
/// back the way the entries were added.
#[derive(Default)]
struct Tree(Vec<(String, Node)>);

impl Tree {
    fn get(&self, path: &str) -> Option<&Node> {
        self.0.iter().find(|(key, _)| key == path).map(|(_, node)| node)
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        self.0
            .iter_mut()
            .find(|(key, _)| key == path)
            .map(|(_, node)| node)
    }

    fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Replaces in place, so an existing entry keeps its position.
    fn insert(&mut self, path: &str, node: Node) {
        match self.get_mut(path) {
            Some(slot) => *slot = node,
            None => self.0.push((path.to_string(), node)),
        }
    }
}

/// Remote tree keyed by absolute `/` path, `/` itself always exists.
pub(crate) struct MemoryRemote {
    nodes: Arc<Mutex<Tree>>,
    faults: Mutex<Faults>,
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("No such file: {}", path))
}

impl MemoryRemote {
    pub(crate) fn new() -> Self {
        let mut nodes = Tree::default();
        nodes.insert("/", Node::Dir);
        Self {
            nodes: Arc::new(Mutex::new(nodes)),
            faults: Mutex::new(Faults::default()),
        }
    }

    pub(crate) fn add_dir(&self, path: &str) {
        self.nodes.lock().insert(path, Node::Dir);
    }

    pub(crate) fn add_file(&self, path: &str, data: &[u8]) {
        self.nodes.lock().insert(path, Node::File(data.to_vec()));
    }

    pub(crate) fn add_special(&self, path: &str, kind: EntryKind) {
        self.nodes.lock().insert(path, Node::Other(kind));
    }

    /// Make `read_dir(path)` fail.
    pub(crate) fn fail_listing_of(&self, path: &str) {
        self.faults.lock().listing.insert(path.to_string());
    }

    /// Make reads of the file at `path` fail after opening.
    pub(crate) fn fail_reads_of(&self, path: &str) {
        self.faults.lock().reads.insert(path.to_string());
    }

    /// Make writes to `path` accept zero bytes.
    pub(crate) fn short_writes_to(&self, path: &str) {
        self.faults.lock().writes.insert(path.to_string());
    }

    /// Make closing a file written at `path` fail.
    pub(crate) fn fail_close_of(&self, path: &str) {
        self.faults.lock().closes.insert(path.to_string());
    }

    pub(crate) fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.lock().get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.lock().get(path), Some(Node::Dir))
    }

    fn require_parent_dir(&self, path: &str) -> io::Result<()> {
        if self.is_dir(parent_of(path)) {
            Ok(())
        } else {
            Err(not_found(parent_of(path)))
        }
    }
}

#[async_trait]
impl RemoteFs for MemoryRemote {
    async fn read_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        if self.faults.lock().listing.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "simulated listing failure",
            ));
        }
        if !self.is_dir(path) {
            return Err(not_found(path));
        }

        let nodes = self.nodes.lock();
        let entries = nodes
            .0
            .iter()
            .filter(|(key, _)| key.as_str() != "/" && parent_of(key) == path)
            .map(|(key, node)| {
                let name = &key[key.rfind('/').map(|i| i + 1).unwrap_or(0)..];
                match node {
                    Node::Dir => RemoteEntry::new(name, EntryKind::Directory, 0),
                    Node::File(data) => {
                        RemoteEntry::new(name, EntryKind::Regular, data.len() as u64)
                    }
                    Node::Other(kind) => RemoteEntry::new(name, *kind, 0),
                }
            })
            .collect();
        Ok(entries)
    }

    async fn open_read(&self, path: &str) -> io::Result<RemoteReader> {
        let data = self.file(path).ok_or_else(|| not_found(path))?;
        if self.faults.lock().reads.contains(path) {
            return Ok(Box::new(FailingReader));
        }
        Ok(Box::new(io::Cursor::new(data)))
    }

    async fn open_write(&self, path: &str, exclusive: bool) -> io::Result<RemoteWriter> {
        self.require_parent_dir(path)?;

        let mut nodes = self.nodes.lock();
        if exclusive && nodes.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("File exists: {}", path),
            ));
        }
        nodes.insert(path, Node::File(Vec::new()));

        let faults = self.faults.lock();
        Ok(Box::new(MemoryWriter {
            path: path.to_string(),
            nodes: self.nodes.clone(),
            stall: faults.writes.contains(path),
            fail_close: faults.closes.contains(path),
        }))
    }

    async fn create_dir(&self, path: &str) -> io::Result<()> {
        self.require_parent_dir(path)?;

        let mut nodes = self.nodes.lock();
        if nodes.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("File exists: {}", path),
            ));
        }
        nodes.insert(path, Node::Dir);
        Ok(())
    }

    async fn canonicalize(&self, path: &str) -> io::Result<String> {
        if self.nodes.lock().contains(path) {
            Ok(path.to_string())
        } else {
            Err(not_found(path))
        }
    }
}

struct FailingReader;

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            "simulated read failure",
        )))
    }
}

struct MemoryWriter {
    path: String,
    nodes: Arc<Mutex<Tree>>,
    stall: bool,
    fail_close: bool,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.stall {
            return Poll::Ready(Ok(0));
        }
        let mut nodes = self.nodes.lock();
        match nodes.get_mut(&self.path) {
            Some(Node::File(data)) => {
                data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            _ => Poll::Ready(Err(not_found(&self.path))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.fail_close {
            return Poll::Ready(Err(io::Error::other("simulated close failure")));
        }
        Poll::Ready(Ok(()))
    }
}
