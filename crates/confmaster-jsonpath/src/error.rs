//! Error types for tokenizing JSON and YAML input.

use thiserror::Error;

/// Result type alias for decoder operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while tokenizing an input document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Malformed JSON at a byte offset.
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// The input ended in the middle of a value.
    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A string or number was not valid UTF-8.
    #[error("Invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// YAML scanner or parser error.
    #[error("YAML error at line {line}, column {col}: {message}")]
    Yaml {
        line: usize,
        col: usize,
        message: String,
    },

    /// Containers nested deeper than the decoder allows.
    #[error("Nesting deeper than {max_depth} at offset {offset}")]
    TooDeep { offset: usize, max_depth: usize },

    /// Input construct that has no token representation (aliases, complex keys).
    #[error("Unsupported construct: {what}")]
    Unsupported { what: String },

    /// Reading the input stream failed.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl DecodeError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        DecodeError::Syntax {
            offset,
            message: message.into(),
        }
    }
}

impl From<yaml_rust2::ScanError> for DecodeError {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let marker = err.marker();
        DecodeError::Yaml {
            line: marker.line(),
            col: marker.col(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io {
            message: err.to_string(),
        }
    }
}
