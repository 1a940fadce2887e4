use bytes::Bytes;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::http::mime::{content_type_for, DEFAULT_CONTENT_TYPE};
use crate::resource::fs::{FileSystem, LocalFileSystem};
use crate::resource::{ResolveError, Resource};

/// File served for targets ending in `/`.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Maps a request target onto a path below `web_root`.
///
/// Query and fragment are dropped and dot segments are normalized. Each
/// segment is percent-decoded before it is matched against the file system,
/// so `/caf%C3%A9.txt` and `/café.txt` name the same file. Empty segments are
/// skipped, so `/a/`, `/a//` and `/a/////` all map to
/// `<web_root>/a/index.html`. A trailing slash always appends the default
/// document, even after a file name (`/test.txt/` maps to
/// `<web_root>/test.txt/index.html`).
///
/// ```
/// # use std::path::Path;
/// # use massive_magenta::resource::resolve_path;
/// let path = resolve_path(Path::new("www"), "/docs//?page=2").unwrap();
/// assert_eq!(path, Path::new("www/docs/index.html"));
/// ```
pub fn resolve_path(web_root: &Path, target: &str) -> Result<PathBuf, ResolveError> {
    let url = parse_target(target)?;
    let segments = url
        .path_segments()
        .ok_or_else(|| ResolveError::InvalidTarget(target.to_string()))?;

    let mut relative = PathBuf::new();

    for segment in segments.filter(|s| !s.is_empty()) {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| ResolveError::InvalidTarget(target.to_string()))?;

        // A decoded segment may carry '/' or be "..": it must stay one plain name
        let mut components = Path::new(decoded.as_ref()).components();

        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return Err(ResolveError::OutsideRoot(target.to_string())),
        }
    }

    if url.path().ends_with('/') {
        relative.push(DEFAULT_DOCUMENT);
    }

    Ok(web_root.join(relative))
}

/// Accepts origin-form (`/path`) and http(s) absolute-form targets.
fn parse_target(target: &str) -> Result<Url, ResolveError> {
    let invalid = || ResolveError::InvalidTarget(target.to_string());

    // Prefixing keeps "//x" from being read as a scheme-relative authority
    let url = if target.starts_with('/') {
        Url::parse(&format!("http://localhost{}", target)).map_err(|_| invalid())?
    } else {
        Url::parse(target).map_err(|_| invalid())?
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

/// Resolves request targets against one web root.
#[derive(Debug, Clone)]
pub struct Resolver<F = LocalFileSystem> {
    web_root: PathBuf,
    fs: F,
}

impl Resolver<LocalFileSystem> {
    pub fn local(web_root: impl Into<PathBuf>) -> Self {
        Self::new(web_root, LocalFileSystem)
    }
}

impl<F: FileSystem> Resolver<F> {
    pub fn new(web_root: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            web_root: web_root.into(),
            fs,
        }
    }

    /// Finds and reads the file a target refers to.
    ///
    /// Directories (with or without an index) are not files and resolve to
    /// `NotAFile`; no listing is ever produced.
    pub async fn resolve(&self, target: &str) -> Result<Resource, ResolveError> {
        let path = resolve_path(&self.web_root, target)?;

        let stat = self.fs.stat(&path).await;
        let stat = match stat {
            Ok(stat) => stat,
            Err(source) => return Err(ResolveError::Io { path, source }),
        };

        if !stat.is_file {
            return Err(ResolveError::NotAFile(path));
        }

        let content = self.fs.read(&path).await;
        let content = match content {
            Ok(content) => content,
            Err(source) => return Err(ResolveError::Io { path, source }),
        };

        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(content_type_for)
            .unwrap_or(DEFAULT_CONTENT_TYPE);

        tracing::trace!(path = %path.display(), size = content.len(), "Resolved file");

        Ok(Resource {
            size: content.len() as u64,
            content: Bytes::from(content),
            content_type: content_type.to_string(),
        })
    }
}
