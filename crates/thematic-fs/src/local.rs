//! Disk-backed browser.

use std::path::Path;
use std::time::SystemTime;

use crate::{has_extension, FileBrowser, FileHandle, FsError};

/// Browser that reads straight from the local filesystem.
///
/// Nothing is cached: every `find` stats the file again and every `read`
/// re-reads it, so template edits are picked up immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBrowser;

impl LocalBrowser {
    /// Creates a new local browser.
    pub fn new() -> Self {
        Self
    }
}

impl FileBrowser for LocalBrowser {
    fn find(&self, path: &Path) -> Option<FileHandle> {
        let metadata = std::fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        // Platforms without mtime support report the epoch, which reads as always fresh.
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(FileHandle::new(path, modified))
    }

    fn list_directory(&self, dir: &Path, extension: &str) -> Result<Vec<FileHandle>, FsError> {
        // The empty path is the working directory, listed with relative paths.
        let current = dir.as_os_str().is_empty();
        let walk_root = if current { Path::new(".") } else { dir };
        if !walk_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        walk_dir_recursive(walk_root, extension, &mut files)?;
        if current {
            files = files
                .into_iter()
                .map(|handle| {
                    let modified = handle.modified();
                    let path = handle.into_path();
                    let relative = path.strip_prefix(walk_root).map(Path::to_path_buf);
                    FileHandle::new(relative.unwrap_or(path), modified)
                })
                .collect();
        }
        files.sort_by(|a, b| a.path().cmp(b.path()));
        tracing::trace!(dir = %dir.display(), count = files.len(), "listed directory");
        Ok(files)
    }

    fn read(&self, handle: &FileHandle) -> Result<String, FsError> {
        std::fs::read_to_string(handle.path()).map_err(|source| FsError::Io {
            path: handle.path().to_path_buf(),
            source,
        })
    }
}

fn walk_dir_recursive(
    current: &Path,
    extension: &str,
    files: &mut Vec<FileHandle>,
) -> Result<(), FsError> {
    let entries = std::fs::read_dir(current).map_err(|source| FsError::Io {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| FsError::Io {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            walk_dir_recursive(&path, extension, files)?;
        } else if path.is_file() && has_extension(&path, extension) {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(FileHandle::new(path, modified));
        }
    }

    Ok(())
}
