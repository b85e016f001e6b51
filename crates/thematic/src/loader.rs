//! Callback surface consumed by template engines.
//!
//! An engine never sees themes or template ids. It asks a [`TemplateLoader`]
//! for a name's source, cache key and freshness, and the loader answers using
//! the context it was bound to.

use std::time::SystemTime;

use thematic_fs::FileHandle;

use crate::context::ResolutionContext;
use crate::resolver::{ResolveError, ResourceResolver};

/// Callbacks a template engine uses while rendering.
pub trait TemplateLoader: Send + Sync {
    /// Returns the source of `name`.
    fn source(&self, name: &str) -> Result<String, ResolveError>;

    /// Returns the key the compiled form of `name` is cached under.
    fn cache_key(&self, name: &str) -> String;

    /// Returns true if `name` has not changed since `since`.
    fn is_fresh(&self, name: &str, since: SystemTime) -> Result<bool, ResolveError>;
}

/// A [`ResourceResolver`] bound to one [`ResolutionContext`].
///
/// Created by [`ResourceResolver::scoped`]. Owns its context, so it can be
/// moved into engine callbacks that must be `'static`.
#[derive(Clone)]
pub struct ScopedLoader {
    resolver: ResourceResolver,
    context: ResolutionContext,
}

impl ScopedLoader {
    pub(crate) fn new(resolver: ResourceResolver, context: ResolutionContext) -> Self {
        Self { resolver, context }
    }

    /// The context lookups run under.
    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Resolves `name` to a file under this loader's context.
    pub fn resolve(&self, name: &str) -> Result<FileHandle, ResolveError> {
        self.resolver.resolve(&self.context, name)
    }
}

impl TemplateLoader for ScopedLoader {
    fn source(&self, name: &str) -> Result<String, ResolveError> {
        self.resolver.source(&self.context, name)
    }

    fn cache_key(&self, name: &str) -> String {
        self.resolver.cache_key(&self.context, name)
    }

    fn is_fresh(&self, name: &str, since: SystemTime) -> Result<bool, ResolveError> {
        self.resolver.is_fresh(&self.context, name, since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thematic_fs::MemoryBrowser;

    #[test]
    fn test_scoped_loader_uses_bound_context() {
        let browser = MemoryBrowser::new()
            .with_file("dark/home.jinja", "dark")
            .with_file("home.jinja", "base");
        let resolver = ResourceResolver::new(browser);

        let themed = resolver.scoped(ResolutionContext::new().with_themes(Some(["dark"])));
        let plain = resolver.scoped(ResolutionContext::new());

        assert_eq!(themed.source("home").unwrap(), "dark");
        assert_eq!(plain.source("home").unwrap(), "base");
        assert_eq!(themed.cache_key("home"), "dark-home");
        assert_eq!(plain.cache_key("home"), "home");
    }

    #[test]
    fn test_scoped_loader_is_object_safe() {
        let resolver = ResourceResolver::new(MemoryBrowser::new().with_file("a.jinja", "A"));
        let loader: std::sync::Arc<dyn TemplateLoader> =
            std::sync::Arc::new(resolver.scoped(ResolutionContext::new()));
        assert_eq!(loader.source("a").unwrap(), "A");
    }
}
