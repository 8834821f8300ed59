//! Error types and load result structures for rule sources.

use std::path::PathBuf;

use crate::schema::FormatError;

/// Errors that can occur while loading a rule document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse/deserialization error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document parsed but a node is not exactly one rule variant.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// No document exists for the reference.
    #[error("rule document not found: {0}")]
    NotFound(String),

    /// The reference is not a usable relative path.
    #[error("invalid rule reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The reference does not end in `.json`, `.yml` or `.yaml`.
    #[error("unsupported rule document format: {0}")]
    UnsupportedFormat(String),

    /// A document loaded, but an element config one of its array nodes
    /// refers to (directly or further down) did not.
    #[error("array element config '{reference}' of '{target}' could not be loaded: {source}")]
    ElementConfig {
        target: String,
        reference: String,
        #[source]
        source: Box<LoadError>,
    },

    /// Filesystem watcher error.
    #[error("Notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

impl LoadError {
    pub(crate) fn invalid_reference(reference: &str, reason: impl Into<String>) -> Self {
        LoadError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the reference simply does not resolve to a document.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::NotFound(_) | LoadError::InvalidReference { .. } | LoadError::UnsupportedFormat(_)
        )
    }
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Outcome of loading a single rule file during a directory scan.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// Document parsed and passed the format check.
    Loaded { reference: String },
    /// File was skipped (dotfile, unsupported extension).
    Skipped { reason: String },
    /// Parse or format error occurred.
    Failed { error: String },
}
