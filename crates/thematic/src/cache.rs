//! Template source cache keyed by resolver cache keys.
//!
//! Entries are stored under [`TemplateLoader::cache_key`] and revalidated with
//! [`TemplateLoader::is_fresh`] against the time they were stored. A stale or
//! missing entry is re-read through the loader.
//!
//! A cache can optionally mirror its entries into a directory. Each entry
//! becomes one file named after the SHA-256 digest of its key; the file's
//! modification time is the entry's stored time (taken just before the
//! source was read), so a cache directory survives
//! process restarts and is still invalidated by source edits.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::error::RenderError;
use crate::loader::TemplateLoader;

const CACHE_FILE_EXTENSION: &str = "cache";

#[derive(Debug, Clone)]
struct CachedSource {
    source: String,
    stored_at: SystemTime,
}

/// Cache of template sources shared by every render of one engine.
#[derive(Debug, Default)]
pub struct TemplateCache {
    dir: Option<PathBuf>,
    entries: Mutex<HashMap<String, CachedSource>>,
}

impl TemplateCache {
    /// Creates a cache that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a cache mirrored into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the directory cannot be created.
    pub fn on_disk(dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| RenderError::io(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "using template cache directory");
        Ok(Self {
            dir: Some(dir),
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// The backing directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Path of the disk entry for `key`, when the cache has a directory.
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{digest}.{CACHE_FILE_EXTENSION}")))
    }

    /// Returns the source of `name`, reusing the cached copy while it is fresh.
    pub fn load(&self, loader: &dyn TemplateLoader, name: &str) -> Result<String, RenderError> {
        let key = loader.cache_key(name);

        if let Some(cached) = self.lookup(&key) {
            if loader.is_fresh(name, cached.stored_at)? {
                tracing::trace!(key = %key, "template cache hit");
                return Ok(cached.source);
            }
            tracing::debug!(key = %key, "template cache entry is stale");
        }

        // Stamped before the read: an edit made while reading leaves the entry stale.
        let stored_at = SystemTime::now();
        let source = loader.source(name)?;
        self.persist(&key, &source, stored_at)?;
        self.entries().insert(
            key,
            CachedSource {
                source: source.clone(),
                stored_at,
            },
        );
        Ok(source)
    }

    /// Drops the entry for `key` from memory and disk.
    pub fn invalidate(&self, key: &str) -> Result<(), RenderError> {
        self.entries().remove(key);
        if let Some(path) = self.path_for(key) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(RenderError::io(path, e)),
            }
        }
        Ok(())
    }

    /// Number of entries held in memory.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns true if no entries are held in memory.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Clears the in-memory entries. Disk entries are left in place.
    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedSource>> {
        // Entries are plain data; a panic mid-insert cannot leave them inconsistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup(&self, key: &str) -> Option<CachedSource> {
        if let Some(cached) = self.entries().get(key) {
            return Some(cached.clone());
        }
        self.read_disk_entry(key)
    }

    fn read_disk_entry(&self, key: &str) -> Option<CachedSource> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return None;
        }

        let read = std::fs::read_to_string(&path).and_then(|source| {
            let stored_at = std::fs::metadata(&path)?.modified()?;
            Ok(CachedSource { source, stored_at })
        });

        match read {
            Ok(cached) => Some(cached),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    fn persist(&self, key: &str, source: &str, stored_at: SystemTime) -> Result<(), RenderError> {
        let Some(path) = self.path_for(key) else {
            return Ok(());
        };

        let mut file = File::create(&path).map_err(|e| RenderError::io(&path, e))?;
        file.write_all(source.as_bytes())
            .and_then(|()| file.set_modified(stored_at))
            .map_err(|e| RenderError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Loader with a controllable freshness answer that counts source reads.
    struct CountingLoader {
        source: String,
        fresh: bool,
        reads: AtomicUsize,
    }

    impl CountingLoader {
        fn new(source: &str, fresh: bool) -> Self {
            Self {
                source: source.to_string(),
                fresh,
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl TemplateLoader for CountingLoader {
        fn source(&self, _name: &str) -> Result<String, ResolveError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.source.clone())
        }

        fn cache_key(&self, name: &str) -> String {
            format!("key-{name}")
        }

        fn is_fresh(&self, _name: &str, _since: SystemTime) -> Result<bool, ResolveError> {
            Ok(self.fresh)
        }
    }

    #[test]
    fn test_fresh_entry_is_reused() {
        let cache = TemplateCache::in_memory();
        let loader = CountingLoader::new("Hello", true);

        assert_eq!(cache.load(&loader, "home").unwrap(), "Hello");
        assert_eq!(cache.load(&loader, "home").unwrap(), "Hello");
        assert_eq!(loader.reads(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_entry_is_reloaded() {
        let cache = TemplateCache::in_memory();
        let loader = CountingLoader::new("Hello", false);

        cache.load(&loader, "home").unwrap();
        cache.load(&loader, "home").unwrap();
        assert_eq!(loader.reads(), 2);
    }

    #[test]
    fn test_disk_cache_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested/cache");

        let cache = TemplateCache::on_disk(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(cache.dir(), Some(dir.as_path()));

        // Idempotent
        TemplateCache::on_disk(&dir).unwrap();
    }

    #[test]
    fn test_disk_entries_survive_new_cache() {
        let temp_dir = TempDir::new().unwrap();
        let loader = CountingLoader::new("Persisted", true);

        let first = TemplateCache::on_disk(temp_dir.path()).unwrap();
        first.load(&loader, "home").unwrap();
        let path = first.path_for("key-home").unwrap();
        assert!(path.is_file());

        let second = TemplateCache::on_disk(temp_dir.path()).unwrap();
        assert_eq!(second.load(&loader, "home").unwrap(), "Persisted");
        assert_eq!(loader.reads(), 1);
    }

    #[test]
    fn test_path_for_is_stable_digest() {
        let temp_dir = TempDir::new().unwrap();
        let cache = TemplateCache::on_disk(temp_dir.path()).unwrap();

        let a = cache.path_for("dark-home").unwrap();
        let b = cache.path_for("dark-home").unwrap();
        let c = cache.path_for("light-home").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.to_string_lossy().ends_with(".cache"));
        assert!(TemplateCache::in_memory().path_for("dark-home").is_none());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = TemplateCache::on_disk(temp_dir.path()).unwrap();
        let loader = CountingLoader::new("x", true);

        cache.load(&loader, "home").unwrap();
        cache.invalidate("key-home").unwrap();
        assert!(cache.is_empty());
        assert!(!cache.path_for("key-home").unwrap().exists());

        cache.load(&loader, "home").unwrap();
        assert_eq!(loader.reads(), 2);
    }

    #[test]
    fn test_freshness_checked_against_stored_time() {
        struct StampLoader {
            modified: SystemTime,
        }

        impl TemplateLoader for StampLoader {
            fn source(&self, _name: &str) -> Result<String, ResolveError> {
                Ok("src".to_string())
            }
            fn cache_key(&self, name: &str) -> String {
                name.to_string()
            }
            fn is_fresh(&self, _name: &str, since: SystemTime) -> Result<bool, ResolveError> {
                Ok(self.modified <= since)
            }
        }

        let cache = TemplateCache::in_memory();
        let old = StampLoader {
            modified: SystemTime::UNIX_EPOCH,
        };
        cache.load(&old, "home").unwrap();

        let edited = StampLoader {
            modified: SystemTime::now() + Duration::from_secs(3600),
        };
        assert_eq!(cache.load(&edited, "home").unwrap(), "src");
        // Reloaded entry is stamped later than the first one.
        assert_eq!(cache.len(), 1);
    }

    /// Loader whose template is edited while its source is being read.
    struct EditedWhileReading {
        modified: std::sync::Mutex<SystemTime>,
        reads: AtomicUsize,
    }

    impl EditedWhileReading {
        fn new() -> Self {
            Self {
                modified: std::sync::Mutex::new(SystemTime::UNIX_EPOCH),
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl TemplateLoader for EditedWhileReading {
        fn source(&self, _name: &str) -> Result<String, ResolveError> {
            std::thread::sleep(Duration::from_millis(5));
            *self.modified.lock().unwrap() = SystemTime::now();
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok("old".to_string())
        }

        fn cache_key(&self, name: &str) -> String {
            name.to_string()
        }

        fn is_fresh(&self, _name: &str, since: SystemTime) -> Result<bool, ResolveError> {
            Ok(*self.modified.lock().unwrap() <= since)
        }
    }

    #[test]
    fn test_edit_during_read_leaves_entry_stale() {
        let cache = TemplateCache::in_memory();
        let loader = EditedWhileReading::new();

        cache.load(&loader, "home").unwrap();
        cache.load(&loader, "home").unwrap();
        assert_eq!(loader.reads(), 2);
    }

    #[test]
    fn test_edit_during_read_leaves_disk_entry_stale() {
        let temp_dir = TempDir::new().unwrap();
        let loader = EditedWhileReading::new();

        TemplateCache::on_disk(temp_dir.path())
            .unwrap()
            .load(&loader, "home")
            .unwrap();

        // A new cache only has the disk entry to go on.
        TemplateCache::on_disk(temp_dir.path())
            .unwrap()
            .load(&loader, "home")
            .unwrap();
        assert_eq!(loader.reads(), 2);
    }

    #[test]
    fn test_clear_drops_memory_entries() {
        let cache = TemplateCache::in_memory();
        let loader = CountingLoader::new("x", true);

        cache.load(&loader, "home").unwrap();
        cache.clear();
        assert!(cache.is_empty());

        cache.load(&loader, "home").unwrap();
        assert_eq!(loader.reads(), 2);
    }
}
