//! In-memory browser for embedded templates and deterministic tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{has_extension, FileBrowser, FileHandle, FsError};

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified: SystemTime,
}

/// Browser serving files from an in-memory map.
///
/// Paths are stored exactly as inserted; `"dark/home.jinja"` and
/// `"./dark/home.jinja"` are different entries.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use std::time::{Duration, SystemTime};
/// use thematic_fs::{FileBrowser, MemoryBrowser};
///
/// let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
/// let browser = MemoryBrowser::new()
///     .with_file_at("page/home.jinja", "Home", stamp);
///
/// let handle = browser.find(Path::new("page/home.jinja")).unwrap();
/// assert_eq!(handle.modified(), stamp);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBrowser {
    files: BTreeMap<PathBuf, MemoryFile>,
}

impl MemoryBrowser {
    /// Creates an empty browser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a file, stamping it with the current time.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.insert_at(path, content, SystemTime::now());
    }

    /// Inserts or replaces a file with an explicit modification time.
    pub fn insert_at(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        modified: SystemTime,
    ) {
        self.files.insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Builder form of [`insert_at`](Self::insert_at).
    pub fn with_file_at(
        mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        modified: SystemTime,
    ) -> Self {
        self.insert_at(path, content, modified);
        self
    }

    /// Removes a file. Returns true if it existed.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        self.files.remove(path.as_ref()).is_some()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileBrowser for MemoryBrowser {
    fn find(&self, path: &Path) -> Option<FileHandle> {
        self.files
            .get(path)
            .map(|file| FileHandle::new(path, file.modified))
    }

    fn list_directory(&self, dir: &Path, extension: &str) -> Result<Vec<FileHandle>, FsError> {
        // BTreeMap iteration is already sorted by path.
        Ok(self
            .files
            .iter()
            .filter(|(path, _)| {
                path.as_path() != dir && path.starts_with(dir) && has_extension(path, extension)
            })
            .map(|(path, file)| FileHandle::new(path.clone(), file.modified))
            .collect())
    }

    fn read(&self, handle: &FileHandle) -> Result<String, FsError> {
        self.files
            .get(handle.path())
            .map(|file| file.content.clone())
            .ok_or_else(|| FsError::Io {
                path: handle.path().to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }
}
