//! # thematic-fs - File Lookup for Template Resolution
//!
//! This crate is the file lookup collaborator used by `thematic`. The resolver
//! never touches the filesystem directly; every existence check, directory
//! listing and content read goes through a [`FileBrowser`].
//!
//! Two browsers are provided:
//!
//! - [`LocalBrowser`]: reads from disk on every call, so edits are visible
//!   immediately.
//! - [`MemoryBrowser`]: serves files from memory, for embedded templates and
//!   for tests that need exact control over modification times.
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use thematic_fs::{FileBrowser, MemoryBrowser};
//!
//! let mut browser = MemoryBrowser::new();
//! browser.insert("dark/page/home.jinja", "Hello");
//!
//! let handle = browser.find(Path::new("dark/page/home.jinja")).unwrap();
//! assert_eq!(browser.read(&handle).unwrap(), "Hello");
//! assert_eq!(
//!     browser.relativize(&handle, Path::new("dark")).unwrap(),
//!     "page/home.jinja"
//! );
//! ```

mod local;
mod memory;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use local::LocalBrowser;
pub use memory::MemoryBrowser;

/// Errors raised by file browsers.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Reading a file or directory failed.
    #[error("failed to read \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A handle was relativized against a root it does not live under.
    #[error("\"{}\" is not under \"{}\"", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// A located file.
///
/// Handles carry the path and the modification time observed when the file
/// was found. Content is read through the browser that produced the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    modified: SystemTime,
}

impl FileHandle {
    /// Creates a handle for `path` last modified at `modified`.
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    /// The path this handle was found at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Consumes the handle, returning its path.
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Source of truth for file existence and content.
///
/// Implementations must not cache results across calls: a file that appears
/// or changes between two calls is reflected by the second one.
pub trait FileBrowser: Send + Sync {
    /// Returns a handle if `path` names an existing file.
    fn find(&self, path: &Path) -> Option<FileHandle>;

    /// Lists every file under `dir` (recursively) whose name ends with
    /// `.{extension}`, sorted by path.
    ///
    /// A directory that does not exist yields an empty list.
    fn list_directory(&self, dir: &Path, extension: &str) -> Result<Vec<FileHandle>, FsError>;

    /// Reads the full content of a previously found file.
    fn read(&self, handle: &FileHandle) -> Result<String, FsError>;

    /// Returns the handle's path relative to `root`, with `/` separators.
    fn relativize(&self, handle: &FileHandle, root: &Path) -> Result<String, FsError> {
        relative_name(handle.path(), root)
    }
}

impl<B: FileBrowser + ?Sized> FileBrowser for std::sync::Arc<B> {
    fn find(&self, path: &Path) -> Option<FileHandle> {
        (**self).find(path)
    }

    fn list_directory(&self, dir: &Path, extension: &str) -> Result<Vec<FileHandle>, FsError> {
        (**self).list_directory(dir, extension)
    }

    fn read(&self, handle: &FileHandle) -> Result<String, FsError> {
        (**self).read(handle)
    }

    fn relativize(&self, handle: &FileHandle, root: &Path) -> Result<String, FsError> {
        (**self).relativize(handle, root)
    }
}

/// Computes `path` relative to `root` using forward slashes.
///
/// An empty `root` returns the whole path.
pub fn relative_name(path: &Path, root: &Path) -> Result<String, FsError> {
    let relative = path.strip_prefix(root).map_err(|_| FsError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    Ok(relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/"))
}

/// Returns true if the file name of `path` ends with `.{extension}`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.len() > extension.len() + 1
                && name.ends_with(extension)
                && name[..name.len() - extension.len()].ends_with('.')
        })
        .unwrap_or(false)
}
