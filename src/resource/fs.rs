//! File-system capability used by the resolver.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// What the resolver needs to know about a path before reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_file: bool,
    pub size: u64,
}

/// Read access to files by path.
///
/// Missing paths are reported as `io::ErrorKind::NotFound`.
pub trait FileSystem: Send + Sync + 'static {
    fn stat(&self, path: &Path) -> impl Future<Output = io::Result<FileStat>> + Send;

    fn read(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// The real file system, accessed through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = tokio::fs::metadata(path).await?;

        Ok(FileStat {
            is_file: meta.is_file(),
            size: meta.len(),
        })
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// In-memory file tree for tests and embedding.
///
/// Adding a file implicitly creates all of its parent directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: HashMap<PathBuf, Node>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        let path = path.into();

        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.nodes.insert(ancestor.to_path_buf(), Node::Dir);
        }

        self.nodes.insert(path, Node::File(content.into()));
        self
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.nodes.insert(path.into(), Node::Dir);
        self
    }

    fn lookup(&self, path: &Path) -> io::Result<&Node> {
        self.nodes.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }
}

impl FileSystem for MemoryFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        match self.lookup(path)? {
            Node::File(content) => Ok(FileStat {
                is_file: true,
                size: content.len() as u64,
            }),
            Node::Dir => Ok(FileStat {
                is_file: false,
                size: 0,
            }),
        }
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.lookup(path)? {
            Node::File(content) => Ok(content.clone()),
            Node::Dir => Err(io::Error::other(format!("{} is a directory", path.display()))),
        }
    }
}
