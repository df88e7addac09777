//! Error types for JSONPath, JSON Pointer and JSON Patch operations.

use std::error::Error;
use std::fmt;

use crate::tokens::Token;

/// JSONPath error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unexpected tokens in a query string.
    Syntax,
    /// A well-typedness violation in a filter expression.
    Type,
    /// An integer literal outside the configured index range.
    Index,
    /// A reference to an unregistered function extension.
    Name,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => f.write_str("syntax error"),
            ErrorKind::Type => f.write_str("type error"),
            ErrorKind::Index => f.write_str("index error"),
            ErrorKind::Name => f.write_str("name error"),
        }
    }
}

/// An error raised while compiling a JSONPath query.
///
/// Carries the offending [`Token`] when one is available; `Display`
/// output includes the token's line and column.
#[derive(Debug, Clone)]
pub struct JsonPathError {
    pub kind: ErrorKind,
    pub message: String,
    pub token: Option<Token>,
}

impl JsonPathError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>, token: Option<Token>) -> Self {
        Self {
            kind,
            message: message.into(),
            token,
        }
    }

    #[must_use]
    pub fn syntax(message: impl Into<String>, token: Token) -> Self {
        Self::new(ErrorKind::Syntax, message, Some(token))
    }

    #[must_use]
    pub fn typ(message: impl Into<String>, token: Token) -> Self {
        Self::new(ErrorKind::Type, message, Some(token))
    }

    #[must_use]
    pub fn index(message: impl Into<String>, token: Token) -> Self {
        Self::new(ErrorKind::Index, message, Some(token))
    }

    #[must_use]
    pub fn name(message: impl Into<String>, token: Token) -> Self {
        Self::new(ErrorKind::Name, message, Some(token))
    }
}

impl fmt::Display for JsonPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "{}: {}, line {}, column {}",
                self.kind, self.message, token.line, token.column
            ),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl Error for JsonPathError {}

/// Result type for JSONPath compilation and matching.
pub type JsonPathResult<T> = Result<T, JsonPathError>;

/// An error raised while parsing or resolving an RFC 6901 JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    /// The pointer string does not follow the RFC 6901 grammar.
    #[error("pointer parse error: {0}")]
    Parse(String),
    /// A mapping along the path is missing the referenced key.
    #[error("no such key: {0:?}")]
    Key(String),
    /// A sequence index is out of range, or `-` was resolved.
    #[error("index out of range: {0}")]
    Index(String),
    /// A pointer part cannot be applied to the value it reached.
    #[error("unexpected type at {0:?}")]
    Type(String),
}

/// An error raised while parsing or applying a Relative JSON Pointer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelativePointerError {
    /// The relative pointer string is malformed.
    #[error("relative pointer syntax error: {0}")]
    Syntax(String),
    /// The origin or an index offset moved outside the document.
    #[error("relative pointer index error: {0}")]
    Index(String),
}

/// An error raised while building or applying an RFC 6902 JSON Patch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// A `test` operation did not find the expected value.
    #[error("test failed: {0}")]
    TestFailure(String),
    /// A malformed or unknown patch operation.
    #[error("invalid patch operation: {0}")]
    Op(String),
    /// A target referenced by an operation does not exist.
    #[error("patch target not found: {0}")]
    Target(String),
    /// Pointer resolution failed while applying an operation.
    #[error(transparent)]
    Pointer(#[from] PointerError),
}
