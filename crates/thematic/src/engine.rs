//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait the adapter delegates
//! rendering to. The default implementation is [`MiniJinjaEngine`].
//!
//! Engines do not know about themes. Every template they need, including the
//! ones pulled in through `{% include %}` or `{% extends %}`, is requested
//! from the [`TemplateLoader`] passed to [`TemplateEngine::render`], which
//! already carries the theme stack and template id of the current call.

use std::sync::Arc;

use minijinja::{Environment, ErrorKind, Value};

use crate::cache::TemplateCache;
use crate::error::RenderError;
use crate::loader::TemplateLoader;

/// A template engine that renders named templates through a loader.
pub trait TemplateEngine: Send + Sync {
    /// Renders `name` with `variables`, loading sources through `loader`.
    fn render(
        &self,
        name: &str,
        variables: &serde_json::Value,
        loader: Arc<dyn TemplateLoader>,
    ) -> Result<String, RenderError>;

    /// Registers an extension (filters, functions, globals).
    fn add_extension(&mut self, extension: Box<dyn Extension>) -> Result<(), RenderError>;
}

/// A bundle of environment additions.
pub trait Extension: Send + Sync {
    /// Name used in logs and to reject duplicate registration.
    fn name(&self) -> &str;

    /// Installs the extension into a MiniJinja environment.
    fn register(&self, env: &mut Environment<'static>);
}

/// An [`Extension`] built from a closure.
///
/// ```rust
/// use thematic::{FnExtension, MiniJinjaEngine, TemplateEngine};
///
/// let mut engine = MiniJinjaEngine::new();
/// engine
///     .add_extension(Box::new(FnExtension::new("shout", |env| {
///         env.add_filter("shout", |s: String| s.to_uppercase());
///     })))
///     .unwrap();
/// ```
pub struct FnExtension<F> {
    name: String,
    register: F,
}

impl<F> FnExtension<F>
where
    F: Fn(&mut Environment<'static>) + Send + Sync,
{
    pub fn new(name: impl Into<String>, register: F) -> Self {
        Self {
            name: name.into(),
            register,
        }
    }
}

impl<F> Extension for FnExtension<F>
where
    F: Fn(&mut Environment<'static>) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, env: &mut Environment<'static>) {
        (self.register)(env)
    }
}

/// MiniJinja-based template engine.
///
/// Holds a base environment with every registered extension. Each render
/// clones it and installs a loader that reads through the engine's
/// [`TemplateCache`], so sources are only re-read when the resolver reports
/// them stale.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    cache: Arc<TemplateCache>,
    extensions: Vec<String>,
}

impl MiniJinjaEngine {
    /// Creates an engine with an in-memory template cache.
    pub fn new() -> Self {
        Self::with_cache(TemplateCache::in_memory())
    }

    /// Creates an engine whose cache is mirrored into `dir`.
    ///
    /// The directory is created if it does not exist.
    pub fn with_cache_dir(dir: impl Into<std::path::PathBuf>) -> Result<Self, RenderError> {
        Ok(Self::with_cache(TemplateCache::on_disk(dir)?))
    }

    /// Creates an engine around an existing cache.
    pub fn with_cache(cache: TemplateCache) -> Self {
        let mut env = Environment::new();
        register_filters(&mut env);
        Self {
            env,
            cache: Arc::new(cache),
            extensions: Vec::new(),
        }
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// The engine's template cache.
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Names of registered extensions, in registration order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(
        &self,
        name: &str,
        variables: &serde_json::Value,
        loader: Arc<dyn TemplateLoader>,
    ) -> Result<String, RenderError> {
        let mut env = self.env.clone();
        let cache = Arc::clone(&self.cache);
        env.set_loader(move |name| match cache.load(loader.as_ref(), name) {
            Ok(source) => Ok(Some(source)),
            Err(RenderError::ResourceNotFound { .. }) => Ok(None),
            Err(err) => Err(minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to load template \"{name}\""),
            )
            .with_source(err)),
        });

        let template = env.get_template(name)?;
        Ok(template.render(Value::from_serialize(variables))?)
    }

    fn add_extension(&mut self, extension: Box<dyn Extension>) -> Result<(), RenderError> {
        let name = extension.name().to_string();
        if self.extensions.contains(&name) {
            return Err(RenderError::InvalidConfiguration(format!(
                "extension \"{name}\" is already registered"
            )));
        }

        extension.register(&mut self.env);
        tracing::debug!(extension = %name, "registered template extension");
        self.extensions.push(name);
        Ok(())
    }
}

/// Registers the built-in filters with a MiniJinja environment.
///
/// This is called automatically by [`MiniJinjaEngine::new`].
pub fn register_filters(env: &mut Environment<'static>) {
    // Newline filter
    env.add_filter("nl", |value: Value| -> String { format!("{}\n", value) });
}
