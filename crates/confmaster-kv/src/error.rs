//! Error type for config tree operations.

use crate::reference::Reference;
use confmaster_jsonpath::DecodeError;
use thiserror::Error;

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, KvError>;

/// Errors produced while reading, writing, decoding, resolving or
/// formatting a config tree.
#[derive(Debug, Error)]
pub enum KvError {
    /// A `$ref` marker whose descriptor is malformed.
    #[error("Invalid reference at '{path}': {message}")]
    InvalidReference {
        /// Location of the marker
        path: String,
        /// What is wrong with the descriptor
        message: String,
    },

    /// Array write more than one past the end.
    #[error("Index {index} out of bounds for array of length {len} at '{path}'")]
    IndexOutOfBound {
        path: String,
        index: usize,
        len: usize,
    },

    /// A non-numeric key used to address an array.
    #[error("Key '{key}' cannot address an array at '{path}'")]
    InvalidKeyOnArray { path: String, key: String },

    #[error("Top-level arrays are not allowed")]
    TopLevelArrayNotAllowed,

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Invalid number '{text}'")]
    InvalidNumber { text: String },

    /// A write that would have to descend through a reference.
    #[error("Path '{path}' passes through a reference")]
    ReferenceConflict { path: String },

    /// A flat key that is both a leaf and the prefix of another key.
    #[error("Path '{path}' is both a value and a prefix of another key")]
    PathConflict { path: String },

    #[error("Reference {reference} cannot be resolved: {message}")]
    ReferenceUnresolvable {
        reference: Reference,
        message: String,
    },

    #[error("Reference {reference} matches {count} applications")]
    AmbiguousReference { reference: Reference, count: usize },

    /// Resolution re-entered a reference that is still being resolved.
    #[error("Cyclic reference: {}", format_chain(.chain))]
    CyclicReference {
        /// The references involved, first to last, ending with the repeat
        chain: Vec<Reference>,
    },

    /// Reference chain longer than the configured limit.
    #[error("Reference nesting too deep (max depth: {max_depth}) at '{path}'")]
    NestingTooDeep { max_depth: usize, path: String },

    #[error("Config still contains references at: {}", .paths.join(", "))]
    UnresolvedReferences { paths: Vec<String> },

    #[error("Definition violated at '{path}': {message}")]
    DefinitionViolation { path: String, message: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Format error: {message}")]
    Format { message: String },
}

fn format_chain(chain: &[Reference]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl KvError {
    pub(crate) fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        KvError::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }
}
