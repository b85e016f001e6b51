//! Per-call resolution parameters.
//!
//! A [`ResolutionContext`] carries everything that varies between lookups:
//! the active theme stack, the template id qualifier and the base path. It is
//! built for one render or lookup and dropped afterwards, so nothing set for
//! one call can leak into the next.
//!
//! ```rust
//! use thematic::ResolutionContext;
//!
//! let ctx = ResolutionContext::new()
//!     .with_themes(Some(["dark", "default"]))
//!     .with_template_id(Some("v2"))
//!     .with_base_path(Some("templates"))
//!     .unwrap();
//!
//! assert_eq!(ctx.themes(), ["dark", "default"]);
//! assert_eq!(ctx.top_theme(), Some("dark"));
//! ```

use std::path::{Path, PathBuf};

use crate::error::RenderError;

/// Immutable parameters for resolving template names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    themes: Vec<String>,
    template_id: Option<String>,
    base_path: Option<PathBuf>,
}

impl ResolutionContext {
    /// An empty context: no themes, no template id, no base path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the theme stack. Order is priority order; `None` clears it.
    pub fn with_themes<I, S>(mut self, themes: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.themes = themes
            .map(|t| t.into_iter().map(Into::into).collect())
            .unwrap_or_default();
        self
    }

    /// Replaces the template id qualifier; `None` clears it.
    pub fn with_template_id(mut self, template_id: Option<impl Into<String>>) -> Self {
        self.template_id = template_id.map(Into::into);
        self
    }

    /// Replaces the base path; `None` clears it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfiguration`] for an empty path.
    pub fn with_base_path(mut self, base_path: Option<impl AsRef<Path>>) -> Result<Self, RenderError> {
        self.base_path = match base_path {
            Some(path) if path.as_ref().as_os_str().is_empty() => {
                return Err(RenderError::InvalidConfiguration(
                    "base path must not be empty".to_string(),
                ));
            }
            Some(path) => Some(path.as_ref().to_path_buf()),
            None => None,
        };
        Ok(self)
    }

    /// Active themes, highest priority first.
    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    /// The highest-priority theme, if any.
    pub fn top_theme(&self) -> Option<&str> {
        self.themes.first().map(String::as_str)
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    /// Root that lookups are joined onto; empty when no base path is set.
    pub(crate) fn root(&self) -> &Path {
        self.base_path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Returns true if neither themes nor a template id are set.
    pub fn is_unthemed(&self) -> bool {
        self.themes.is_empty() && self.template_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let ctx = ResolutionContext::new();
        assert!(ctx.themes().is_empty());
        assert!(ctx.template_id().is_none());
        assert!(ctx.base_path().is_none());
        assert!(ctx.is_unthemed());
        assert_eq!(ctx.root(), Path::new(""));
    }

    #[test]
    fn test_themes_keep_order_and_duplicates() {
        let ctx = ResolutionContext::new().with_themes(Some(["b", "a", "b"]));
        assert_eq!(ctx.themes(), ["b", "a", "b"]);
        assert_eq!(ctx.top_theme(), Some("b"));
    }

    #[test]
    fn test_none_clears() {
        let ctx = ResolutionContext::new()
            .with_themes(Some(["dark"]))
            .with_template_id(Some("en"))
            .with_base_path(Some("templates"))
            .unwrap()
            .with_themes(None::<Vec<String>>)
            .with_template_id(None::<String>)
            .with_base_path(None::<&str>)
            .unwrap();

        assert_eq!(ctx, ResolutionContext::new());
    }

    #[test]
    fn test_empty_base_path_rejected() {
        let result = ResolutionContext::new().with_base_path(Some(""));
        assert!(matches!(result, Err(RenderError::InvalidConfiguration(_))));
    }
}
