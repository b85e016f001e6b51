//! The render adapter.
//!
//! [`RenderAdapter`] ties a [`TemplateEngine`] to a [`ResourceResolver`] and a
//! [`ThemeHierarchy`]. Every operation runs inside a [`ResolutionScope`]:
//!
//! 1. `pre_process` derives a [`ResolutionContext`] from the template
//! 2. the resolver or engine does its work under that context
//! 3. the scope is dropped, on success, error or panic alike
//!
//! The context is never stored on the adapter, so one call's themes and
//! template id cannot be observed by the next.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thematic_fs::{FileBrowser, LocalBrowser};

use crate::config::AdapterConfig;
use crate::context::ResolutionContext;
use crate::engine::{Extension, MiniJinjaEngine, TemplateEngine};
use crate::error::RenderError;
use crate::hierarchy::ThemeHierarchy;
use crate::resolver::ResourceResolver;
use crate::template::Template;

/// A resolution context held for the duration of one adapter call.
///
/// Dropping the scope is the post-processing step; it cannot be skipped.
#[must_use = "the scope is released as soon as it is dropped"]
pub struct ResolutionScope<'a> {
    context: ResolutionContext,
    active: &'a AtomicUsize,
}

impl<'a> ResolutionScope<'a> {
    fn enter(context: ResolutionContext, active: &'a AtomicUsize) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            themes = ?context.themes(),
            template_id = ?context.template_id(),
            "entered resolution scope"
        );
        Self { context, active }
    }

    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }
}

impl Drop for ResolutionScope<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(themes = ?self.context.themes(), "released resolution scope");
    }
}

/// Renders [`Template`]s through a theme-aware resolver.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use thematic::{MiniJinjaEngine, RenderAdapter, ResourceResolver, Template, ThemeTree};
/// use thematic_fs::MemoryBrowser;
///
/// let browser = MemoryBrowser::new()
///     .with_file("home.jinja", "Hello {{ name }}")
///     .with_file("dark/home.jinja", "Dark hello {{ name }}");
///
/// let adapter = RenderAdapter::new(MiniJinjaEngine::new(), ResourceResolver::new(browser))
///     .with_hierarchy(ThemeTree::new().add("default").add_child("dark", "default"));
///
/// let plain = Template::new("home").with_vars(json!({"name": "you"}));
/// assert_eq!(adapter.render(&plain).unwrap(), "Hello you");
///
/// let dark = plain.themed("dark", None);
/// assert_eq!(adapter.render(&dark).unwrap(), "Dark hello you");
/// ```
pub struct RenderAdapter {
    engine: Box<dyn TemplateEngine>,
    resolver: ResourceResolver,
    hierarchy: Box<dyn ThemeHierarchy>,
    base_path: Option<PathBuf>,
    active_scopes: AtomicUsize,
}

impl RenderAdapter {
    /// Creates an adapter with no base path.
    ///
    /// Until [`with_hierarchy`](Self::with_hierarchy) is called, a theme's
    /// hierarchy is the theme alone.
    pub fn new(engine: impl TemplateEngine + 'static, resolver: ResourceResolver) -> Self {
        Self {
            engine: Box::new(engine),
            resolver,
            hierarchy: Box::new(standalone_theme),
            base_path: None,
            active_scopes: AtomicUsize::new(0),
        }
    }

    /// Builds the default stack from configuration: a [`MiniJinjaEngine`]
    /// (with a disk cache when `cache_dir` is set) over a [`LocalBrowser`].
    pub fn from_config(config: &AdapterConfig) -> Result<Self, RenderError> {
        config.validate()?;

        let engine = match &config.cache_dir {
            Some(dir) => MiniJinjaEngine::with_cache_dir(dir.clone())?,
            None => MiniJinjaEngine::new(),
        };

        Self::new(engine, ResourceResolver::new(LocalBrowser))
            .with_hierarchy(config.themes.clone())
            .with_base_path(config.base_path.as_deref())
    }

    /// Replaces the theme hierarchy provider.
    pub fn with_hierarchy(mut self, hierarchy: impl ThemeHierarchy + 'static) -> Self {
        self.hierarchy = Box::new(hierarchy);
        self
    }

    /// Sets the base path every lookup is rooted at; `None` clears it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfiguration`] for an empty path.
    pub fn with_base_path(mut self, base_path: Option<impl AsRef<Path>>) -> Result<Self, RenderError> {
        let base_path = base_path.map(|p| p.as_ref().to_path_buf());
        if base_path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(RenderError::InvalidConfiguration(
                "base path must not be empty".to_string(),
            ));
        }
        self.base_path = base_path;
        Ok(self)
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    pub fn browser(&self) -> &dyn FileBrowser {
        self.resolver.browser()
    }

    /// Number of resolution scopes currently held. Zero between calls.
    pub fn active_scopes(&self) -> usize {
        self.active_scopes.load(Ordering::SeqCst)
    }

    /// Renders `template`.
    ///
    /// # Errors
    ///
    /// - [`RenderError::ResourceNotSet`] if the template names no resource
    /// - [`RenderError::ResourceNotFound`] if the resource does not resolve
    /// - [`RenderError::UnknownTheme`] / [`RenderError::ThemeCycle`] from the
    ///   hierarchy
    /// - [`RenderError::Template`] for engine errors, unchanged
    #[tracing::instrument(skip(self, template), fields(resource = ?template.resource()))]
    pub fn render(&self, template: &Template) -> Result<String, RenderError> {
        let name = template.resource().ok_or(RenderError::ResourceNotSet)?;
        let scope = self.pre_process(template)?;

        self.resolver.resolve(scope.context(), name)?;
        let loader = Arc::new(self.resolver.scoped(scope.context().clone()));
        self.engine.render(name, template.variables(), loader)
    }

    /// Resolves `template` to a file path without rendering it.
    pub fn get_file(&self, template: &Template) -> Result<PathBuf, RenderError> {
        let name = template.resource().ok_or(RenderError::ResourceNotSet)?;
        let scope = self.pre_process(template)?;

        let handle = self.resolver.resolve(scope.context(), name)?;
        Ok(handle.into_path())
    }

    /// Returns true if `template` resolves to a file.
    pub fn exists(&self, template: &Template) -> Result<bool, RenderError> {
        let name = template.resource().ok_or(RenderError::ResourceNotSet)?;
        let scope = self.pre_process(template)?;

        Ok(self.resolver.exists(scope.context(), name)?)
    }

    /// Lists templates under `namespace`.
    ///
    /// With a theme, the theme and its ancestors are listed, most specific
    /// first. Without one, only the base path is listed.
    pub fn list_files(
        &self,
        namespace: &str,
        theme: Option<&str>,
    ) -> Result<BTreeMap<String, String>, RenderError> {
        let themes = match theme {
            Some(theme) => self.hierarchy.ancestors(theme)?,
            None => Vec::new(),
        };
        let scope = self.enter(self.context()?.with_themes(Some(themes)));

        Ok(self.resolver.list_resources(scope.context(), namespace)?)
    }

    /// Derives the resolution context for `template` and holds it until the
    /// returned scope is dropped.
    ///
    /// An un-themed template gets no themes and no template id. A themed
    /// variant gets its theme's full hierarchy and its template id. The
    /// adapter's base path applies to both.
    pub fn pre_process(&self, template: &Template) -> Result<ResolutionScope<'_>, RenderError> {
        let context = match template.variant() {
            Some(variant) => self
                .context()?
                .with_themes(Some(self.hierarchy.ancestors(&variant.theme)?))
                .with_template_id(variant.template_id.as_deref()),
            None => self.context()?,
        };
        Ok(self.enter(context))
    }

    /// Registers an engine extension.
    pub fn add_extension(&mut self, extension: Box<dyn Extension>) -> Result<(), RenderError> {
        self.engine.add_extension(extension)
    }

    fn context(&self) -> Result<ResolutionContext, RenderError> {
        ResolutionContext::new().with_base_path(self.base_path.as_deref())
    }

    fn enter(&self, context: ResolutionContext) -> ResolutionScope<'_> {
        ResolutionScope::enter(context, &self.active_scopes)
    }
}

fn standalone_theme(theme: &str) -> Result<Vec<String>, RenderError> {
    Ok(vec![theme.to_string()])
}
