//! Error types for resolution and rendering.
//!
//! [`RenderError`] is the error returned by every public operation of the
//! adapter. Resolution failures from the resolver itself are
//! [`ResolveError`](crate::ResolveError) and convert into it.

use std::path::PathBuf;

use crate::resolver::ResolveError;

/// Error type for render and lookup operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A render or lookup was requested without naming a template.
    #[error("no template resource was set")]
    ResourceNotSet,

    /// No candidate file existed at any theme or qualifier level.
    #[error("template \"{name}\" not found (last tried {})", .last_tried.display())]
    ResourceNotFound { name: String, last_tried: PathBuf },

    /// Malformed configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The hierarchy provider does not know the theme.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    /// A theme is its own ancestor.
    #[error("theme inheritance cycle: {0}")]
    ThemeCycle(String),

    /// Error raised by the template engine, passed through untouched.
    #[error(transparent)]
    Template(#[from] minijinja::Error),

    /// Resolution failure other than a missing template.
    #[error(transparent)]
    Resolve(ResolveError),

    /// I/O error outside the file browser (cache directory, config files).
    #[error("I/O error on \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Render variables could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl From<ResolveError> for RenderError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { name, last_tried } => {
                RenderError::ResourceNotFound { name, last_tried }
            }
            other => RenderError::Resolve(other),
        }
    }
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenderError::Io {
            path: path.into(),
            source,
        }
    }
}
