//! Error types for loading form definitions.

use flatland_core::FlatlandError;
use thiserror::Error;

/// Errors raised while reading, writing or compiling definitions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A definition that parses but does not describe a schema.
    #[error("invalid definition at '{path}': {message}")]
    InvalidDefinition { path: String, message: String },

    /// An option value rejected by the engine, such as a bad number format.
    #[error(transparent)]
    Flatland(#[from] FlatlandError),

    /// No form registered under the name.
    #[error("unknown form '{0}'")]
    UnknownForm(String),

    /// All configured registry sources failed.
    #[error("no definition sources available")]
    NoSourcesAvailable,
}

impl DefinitionError {
    pub(crate) fn invalid(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            message: message.into(),
        }
    }
}

/// Convenience alias for results with [`DefinitionError`].
pub type Result<T> = std::result::Result<T, DefinitionError>;
