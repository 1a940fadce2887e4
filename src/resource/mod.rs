//! Static resource lookup
//!
//! Maps request targets onto files below the configured web root and reads
//! them through a [`FileSystem`] capability. Every failure is reported as a
//! [`ResolveError`], all of which the HTTP layer answers with 404.

pub mod fs;
pub mod resolver;

pub use fs::{FileStat, FileSystem, LocalFileSystem, MemoryFileSystem};
pub use resolver::{resolve_path, Resolver, DEFAULT_DOCUMENT};

use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;

/// A file that was found and read.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub content: Bytes,
    /// Byte length of `content`
    pub size: u64,
    pub content_type: String,
}

/// Reasons a target did not resolve to a file.
#[derive(Debug)]
pub enum ResolveError {
    /// Neither origin-form nor an http(s) absolute URL
    InvalidTarget(String),
    /// A path component would leave the web root
    OutsideRoot(String),
    /// The path exists but is not a regular file (e.g. a directory)
    NotAFile(PathBuf),
    /// Stat or read failed, including "no such file"
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvalidTarget(t) => write!(f, "invalid request target {:?}", t),
            ResolveError::OutsideRoot(t) => write!(f, "target {:?} escapes the web root", t),
            ResolveError::NotAFile(p) => write!(f, "{} is not a file", p.display()),
            ResolveError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
