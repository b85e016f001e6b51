//! Theme inheritance.
//!
//! Themes may extend a parent theme. The hierarchy of a theme is the theme
//! itself followed by its ancestors, nearest first, and is exactly the theme
//! stack resolution walks:
//!
//! ```rust
//! use thematic::{ThemeHierarchy, ThemeTree};
//!
//! let tree = ThemeTree::from_yaml(r#"
//! midnight:
//!   parent: dark
//! dark:
//!   parent: default
//! default: {}
//! "#).unwrap();
//!
//! assert_eq!(tree.ancestors("midnight").unwrap(), ["midnight", "dark", "default"]);
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Provides the ordered ancestor chain of a theme.
pub trait ThemeHierarchy: Send + Sync {
    /// Returns `theme` followed by its ancestors, most specific first.
    fn ancestors(&self, theme: &str) -> Result<Vec<String>, RenderError>;
}

impl<F> ThemeHierarchy for F
where
    F: Fn(&str) -> Result<Vec<String>, RenderError> + Send + Sync,
{
    fn ancestors(&self, theme: &str) -> Result<Vec<String>, RenderError> {
        self(theme)
    }
}

/// Definition of one theme in a [`ThemeTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDefinition {
    /// Theme this one extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Theme hierarchy backed by a theme → parent map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeTree {
    themes: BTreeMap<String, ThemeDefinition>,
}

impl ThemeTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root theme (one without a parent).
    pub fn add(mut self, theme: impl Into<String>) -> Self {
        self.themes.insert(theme.into(), ThemeDefinition::default());
        self
    }

    /// Adds a theme extending `parent`.
    pub fn add_child(mut self, theme: impl Into<String>, parent: impl Into<String>) -> Self {
        self.themes.insert(
            theme.into(),
            ThemeDefinition {
                parent: Some(parent.into()),
            },
        );
        self
    }

    /// Parses a tree from YAML: a map of theme name to `{ parent: ... }`.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        let tree: Self = serde_yaml::from_str(yaml)?;
        tree.validate()?;
        Ok(tree)
    }

    /// Checks that every parent exists and no theme is its own ancestor.
    pub fn validate(&self) -> Result<(), RenderError> {
        for (name, definition) in &self.themes {
            if let Some(parent) = &definition.parent {
                if !self.themes.contains_key(parent) {
                    return Err(RenderError::UnknownTheme(format!(
                        "{parent} (parent of {name})"
                    )));
                }
            }
            self.ancestors(name)?;
        }
        Ok(())
    }

    /// Returns true if the tree defines `theme`.
    pub fn contains(&self, theme: &str) -> bool {
        self.themes.contains_key(theme)
    }

    /// Defined theme names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

impl ThemeHierarchy for ThemeTree {
    fn ancestors(&self, theme: &str) -> Result<Vec<String>, RenderError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(theme.to_string());

        while let Some(name) = current {
            let definition = self
                .themes
                .get(&name)
                .ok_or_else(|| RenderError::UnknownTheme(name.clone()))?;

            if !seen.insert(name.clone()) {
                chain.push(name);
                return Err(RenderError::ThemeCycle(chain.join(" -> ")));
            }

            current = definition.parent.clone();
            chain.push(name);
        }

        Ok(chain)
    }
}
