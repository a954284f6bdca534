//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Pattern compile failures are deliberately absent: they are recorded on the
/// offending [`Rule`](super::Rule) and never abort processing of other rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested document does not exist.
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    /// The document exists but is not well-formed JSON of the expected shape.
    #[error("Failed to parse document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Represents an I/O error, typically from reading or writing a document.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// A value could not be turned into its JSON representation.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A search-engine URL template without a `{}` placeholder.
    #[error("Invalid search template (expected one '{{}}'): {0}")]
    InvalidTemplate(String),

    /// A scope transition that would break the scope/genre invariant.
    #[error("Invalid scope change: {0}")]
    InvalidScope(String),

    /// No rule with the given key exists in the collection.
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Example title not found: {0}")]
    ExampleNotFound(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
