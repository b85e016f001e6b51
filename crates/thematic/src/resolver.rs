//! Theme-aware template resolution.
//!
//! [`ResourceResolver`] turns a logical template name into a concrete file.
//! Lookups walk the theme stack of a [`ResolutionContext`] in priority order,
//! then fall back to the un-themed base path. At every level the template id
//! qualified file is probed before the plain one.
//!
//! # Probe Order
//!
//! With themes `["dark", "default"]`, template id `"v2"` and name
//! `"page/home"`:
//!
//! | # | Candidate |
//! |---|-----------|
//! | 1 | `dark/page/home.v2.jinja` |
//! | 2 | `dark/page/home.jinja` |
//! | 3 | `default/page/home.v2.jinja` |
//! | 4 | `default/page/home.jinja` |
//! | 5 | `page/home.v2.jinja` |
//! | 6 | `page/home.jinja` |
//!
//! A base path, when set, prefixes every candidate. The first existing
//! candidate wins.
//!
//! # Cache Keys
//!
//! [`ResourceResolver::cache_key`] combines the top theme, the name and the
//! template id. Only the top theme takes part: two theme stacks that share a
//! top theme but resolve a name through different lower themes produce the
//! same key. Callers mixing such stacks against one cache must account for
//! this.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use thematic_fs::{FileBrowser, FileHandle, FsError};

use crate::context::ResolutionContext;
use crate::loader::ScopedLoader;

/// Extension shared by every template file.
pub const TEMPLATE_EXTENSION: &str = "jinja";

/// Error type for resolver operations.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No candidate existed. `last_tried` is the un-themed, unqualified path.
    #[error("template \"{name}\" not found (last tried {})", .last_tried.display())]
    NotFound { name: String, last_tried: PathBuf },

    /// Empty names and names with `..` segments are rejected.
    #[error("invalid template name: \"{0}\"")]
    InvalidName(String),

    /// The file browser failed.
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Resolves template names against a [`FileBrowser`].
///
/// The resolver itself is stateless apart from its browser; all per-call
/// parameters travel in a [`ResolutionContext`]. Cloning is cheap and clones
/// share the browser.
#[derive(Clone)]
pub struct ResourceResolver {
    browser: Arc<dyn FileBrowser>,
}

impl ResourceResolver {
    /// Creates a resolver over the given browser.
    pub fn new(browser: impl FileBrowser + 'static) -> Self {
        Self {
            browser: Arc::new(browser),
        }
    }

    /// Creates a resolver over an already shared browser.
    pub fn from_shared(browser: Arc<dyn FileBrowser>) -> Self {
        Self { browser }
    }

    /// The underlying browser.
    pub fn browser(&self) -> &dyn FileBrowser {
        self.browser.as_ref()
    }

    /// Every path [`resolve`](Self::resolve) would probe, in order.
    pub fn candidates(
        &self,
        ctx: &ResolutionContext,
        name: &str,
    ) -> Result<Vec<PathBuf>, ResolveError> {
        let name = normalize_name(name)?;
        let root = ctx.root();

        let mut levels: Vec<PathBuf> = ctx.themes().iter().map(|t| root.join(t)).collect();
        levels.push(root.to_path_buf());

        let mut candidates = Vec::with_capacity(levels.len() * 2);
        for level in levels {
            if let Some(id) = ctx.template_id() {
                candidates.push(level.join(format!("{name}.{id}.{TEMPLATE_EXTENSION}")));
            }
            candidates.push(level.join(format!("{name}.{TEMPLATE_EXTENSION}")));
        }
        Ok(candidates)
    }

    /// Finds the best matching file for `name`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidName`] for empty or escaping names
    /// - [`ResolveError::NotFound`] if no candidate exists
    pub fn resolve(&self, ctx: &ResolutionContext, name: &str) -> Result<FileHandle, ResolveError> {
        let candidates = self.candidates(ctx, name)?;

        for candidate in &candidates {
            tracing::trace!(candidate = %candidate.display(), "probing template candidate");
            if let Some(handle) = self.browser.find(candidate) {
                tracing::debug!(template = name, path = %handle.path().display(), "resolved template");
                return Ok(handle);
            }
        }

        let last_tried = candidates.last().cloned().unwrap_or_default();
        tracing::debug!(template = name, last_tried = %last_tried.display(), "template not found");
        Err(ResolveError::NotFound {
            name: name.to_string(),
            last_tried,
        })
    }

    /// Returns true if `name` resolves.
    ///
    /// Only a missing template reads as `false`; invalid names and browser
    /// failures are returned as errors.
    pub fn exists(&self, ctx: &ResolutionContext, name: &str) -> Result<bool, ResolveError> {
        match self.resolve(ctx, name) {
            Ok(_) => Ok(true),
            Err(ResolveError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Resolves `name` and reads its content.
    pub fn source(&self, ctx: &ResolutionContext, name: &str) -> Result<String, ResolveError> {
        let handle = self.resolve(ctx, name)?;
        Ok(self.browser.read(&handle)?)
    }

    /// Key identifying the compiled form of `name` under `ctx`.
    ///
    /// `top_theme + "-"` (when themes are set), then the name, then the
    /// template id (when set), with no separator before the id. The name is
    /// normalized the way [`resolve`](Self::resolve) normalizes it, so
    /// `"/home"` and `"home"` share a key.
    pub fn cache_key(&self, ctx: &ResolutionContext, name: &str) -> String {
        let name = normalize_name(name).unwrap_or(name);
        let mut key = String::new();
        if let Some(theme) = ctx.top_theme() {
            key.push_str(theme);
            key.push('-');
        }
        key.push_str(name);
        if let Some(id) = ctx.template_id() {
            key.push_str(id);
        }
        key
    }

    /// Returns true if the resolved file was last modified at or before `since`.
    pub fn is_fresh(
        &self,
        ctx: &ResolutionContext,
        name: &str,
        since: SystemTime,
    ) -> Result<bool, ResolveError> {
        let handle = self.resolve(ctx, name)?;
        Ok(handle.modified() <= since)
    }

    /// Lists templates under `namespace` across the theme stack.
    ///
    /// Keys are paths relative to each theme root and values are paths
    /// relative to the namespace directory, both without extension. When
    /// several themes provide the same key, the highest-priority theme's
    /// entry is kept. Without themes only the base path is listed.
    pub fn list_resources(
        &self,
        ctx: &ResolutionContext,
        namespace: &str,
    ) -> Result<BTreeMap<String, String>, ResolveError> {
        let namespace = normalize_namespace(namespace)?;
        let root = ctx.root();

        let roots: Vec<PathBuf> = if ctx.themes().is_empty() {
            vec![root.to_path_buf()]
        } else {
            ctx.themes().iter().map(|t| root.join(t)).collect()
        };

        let mut resources = BTreeMap::new();
        for theme_root in &roots {
            let dir = if namespace.is_empty() {
                theme_root.clone()
            } else {
                theme_root.join(namespace)
            };

            for handle in self.browser.list_directory(&dir, TEMPLATE_EXTENSION)? {
                let key = strip_extension(&self.browser.relativize(&handle, theme_root)?);
                let value = strip_extension(&self.browser.relativize(&handle, &dir)?);
                resources.entry(key).or_insert(value);
            }
        }

        tracing::debug!(namespace, count = resources.len(), "listed templates");
        Ok(resources)
    }

    /// Binds this resolver to one context for use as an engine loader.
    pub fn scoped(&self, ctx: ResolutionContext) -> ScopedLoader {
        ScopedLoader::new(self.clone(), ctx)
    }
}

/// Removes the template extension from a relative name, if present.
pub fn strip_extension(name: &str) -> String {
    name.strip_suffix(TEMPLATE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(name)
        .to_string()
}

fn normalize_name(name: &str) -> Result<&str, ResolveError> {
    let trimmed = name.trim_start_matches('/');
    if trimmed.is_empty() || has_parent_segment(trimmed) {
        return Err(ResolveError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

fn normalize_namespace(namespace: &str) -> Result<&str, ResolveError> {
    let trimmed = namespace.trim_matches('/');
    if has_parent_segment(trimmed) {
        return Err(ResolveError::InvalidName(namespace.to_string()));
    }
    Ok(trimmed)
}

fn has_parent_segment(name: &str) -> bool {
    Path::new(name)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
}
