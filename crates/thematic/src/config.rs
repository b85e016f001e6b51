//! Adapter configuration.
//!
//! ```yaml
//! base_path: templates
//! cache_dir: .cache/templates
//! themes:
//!   dark:
//!     parent: default
//!   default: {}
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::hierarchy::ThemeTree;

/// Settings for [`RenderAdapter::from_config`](crate::RenderAdapter::from_config).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Root prefix for every template lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,

    /// Directory the template cache is mirrored into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Theme inheritance.
    pub themes: ThemeTree,
}

impl AdapterConfig {
    /// Parses and validates a YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| RenderError::io(path, e))?;
        tracing::debug!(path = %path.display(), "loaded adapter config");
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        for (field, value) in [("base_path", &self.base_path), ("cache_dir", &self.cache_dir)] {
            if value.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                return Err(RenderError::InvalidConfiguration(format!(
                    "{field} must not be empty"
                )));
            }
        }
        self.themes.validate()
    }
}
