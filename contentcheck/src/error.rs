//! Error types for loading content and its supporting stores.

use thiserror::Error;

/// Errors raised while reading or interpreting content files.
///
/// None of these abort a validation run: the pipeline turns them into a
/// structural failure of the single file involved.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    /// The file could not be opened or read.
    #[error("{path}: failed to read file: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file exceeded the configured maximum size.
    #[error("{path}: file exceeds maximum size of {limit} bytes")]
    TooLarge { path: String, limit: u64 },

    /// The file is not valid UTF-8.
    #[error("{path}: file is not valid UTF-8")]
    InvalidEncoding { path: String },

    /// The file could not be parsed as YAML or JSON.
    #[error("{path}: parse error: {message}")]
    Parse { path: String, message: String },

    /// The file extension has no loader.
    #[error("{path}: unsupported file extension")]
    UnsupportedExtension { path: String },

    /// A package directory has no definition file.
    #[error("{dir}: package has no definition yml")]
    MissingDefinition { dir: String },

    /// A structural schema could not be compiled.
    #[error("schema '{name}' is not a valid JSON Schema: {message}")]
    InvalidSchema { name: String, message: String },
}

impl ContentError {
    pub(crate) fn parse(path: &str, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_owned(),
            message: message.to_string(),
        }
    }
}
