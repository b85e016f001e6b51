//! # Thematic - Theme-Aware Template Resolution
//!
//! `thematic` resolves logical template names to files across a stack of
//! themes and renders them with [MiniJinja](minijinja). A theme is a directory
//! of overrides: a file present in a higher-priority theme shadows the same
//! name in lower themes and in the un-themed base.
//!
//! ## Core Concepts
//!
//! - [`ResolutionContext`]: the themes, template id and base path of one call
//! - [`ResourceResolver`]: finds the best file for a name under a context
//! - [`TemplateLoader`]: the callbacks an engine uses to load includes
//! - [`TemplateEngine`]: renders names through a loader ([`MiniJinjaEngine`])
//! - [`ThemeHierarchy`]: maps a theme to its ancestor chain ([`ThemeTree`])
//! - [`RenderAdapter`]: renders [`Template`]s, releasing per-call state
//!   through a [`ResolutionScope`]
//!
//! ## Resolution Order
//!
//! For each theme in priority order, `theme/name.<id>.jinja` is tried, then
//! `theme/name.jinja`. After the themes, the un-themed base is tried the same
//! way. The first existing file wins. See [`resolver`] for the full table.
//!
//! ## Quick Start
//!
//! ```rust
//! use thematic::{MiniJinjaEngine, RenderAdapter, ResourceResolver, Template, ThemeTree};
//! use thematic_fs::MemoryBrowser;
//!
//! let browser = MemoryBrowser::new()
//!     .with_file("layout.jinja", "<{% block body %}{% endblock %}>")
//!     .with_file("page.jinja", "{% extends 'layout' %}{% block body %}{{ title }}{% endblock %}")
//!     .with_file("dark/layout.jinja", "[{% block body %}{% endblock %}]");
//!
//! let themes = ThemeTree::from_yaml("dark: { parent: default }\ndefault: {}").unwrap();
//! let adapter = RenderAdapter::new(MiniJinjaEngine::new(), ResourceResolver::new(browser))
//!     .with_hierarchy(themes);
//!
//! let page = Template::new("page").with_var("title", "Home");
//! assert_eq!(adapter.render(&page).unwrap(), "<Home>");
//! assert_eq!(adapter.render(&page.themed("dark", None)).unwrap(), "[Home]");
//! ```
//!
//! ## Configuration
//!
//! [`AdapterConfig`] loads the base path, cache directory and theme tree from
//! YAML, and [`RenderAdapter::from_config`] builds a disk-backed adapter from
//! it.

mod adapter;
mod cache;
mod config;
mod context;
mod engine;
mod error;
mod hierarchy;
mod loader;
pub mod resolver;
mod template;

pub use adapter::{RenderAdapter, ResolutionScope};
pub use cache::TemplateCache;
pub use config::AdapterConfig;
pub use context::ResolutionContext;
pub use engine::{register_filters, Extension, FnExtension, MiniJinjaEngine, TemplateEngine};
pub use error::RenderError;
pub use hierarchy::{ThemeDefinition, ThemeHierarchy, ThemeTree};
pub use loader::{ScopedLoader, TemplateLoader};
pub use resolver::{strip_extension, ResolveError, ResourceResolver, TEMPLATE_EXTENSION};
pub use template::{Template, ThemedVariant};

// Re-export minijinja for extension authors
pub use minijinja;
