//! Error types for Grove
//!
//! Every layer (codecs, query builder, client, iterator) reports failures
//! through the single [`Error`] enum defined here. We use `thiserror` for the
//! `Display` and `Error` implementations.
//!
//! # Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Malformed input | `UnsupportedType`, `InvalidInput`, `InvalidKey`, `IntegerOverflow` |
//! | Not found | `NoSuchEntity` |
//! | Partial failure | `Multi` |
//! | Decode mismatch | `TypeMismatch`, `Field` |
//! | Recursion | `RecursionLimitExceeded` |
//! | Protocol | `Wire` |
//! | Transport | `Transport` (passed through unchanged) |
//! | Iteration | `CursorUnavailable`, `Cancelled` |
//! | Configuration | `Config` |
//!
//! `Error` is `Clone` so a failed result iterator can hand the same terminal
//! error to every later call.

use crate::key::Key;
use std::fmt;
use thiserror::Error;

/// Result type alias for Grove operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Grove
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    // ==================== Malformed input ====================
    /// The value kind has no typed-property representation
    #[error("unsupported type: {kind}")]
    UnsupportedType {
        /// Name of the offending kind
        kind: String,
    },

    /// An operation argument is not acceptable
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong
        reason: String,
    },

    /// A key is structurally invalid for the requested operation
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// What was wrong
        reason: String,
    },

    /// An integer does not fit the destination width
    #[error("integer overflow: {value} does not fit in {target}")]
    IntegerOverflow {
        /// Decimal form of the value
        value: String,
        /// Destination type name
        target: &'static str,
    },

    // ==================== Not found ====================
    /// The store has no entity under the key
    #[error("no such entity: {key}")]
    NoSuchEntity {
        /// The key that was looked up
        key: Key,
    },

    // ==================== Partial failure ====================
    /// Positional errors from a multi-item operation
    #[error("{0}")]
    Multi(MultiError),

    // ==================== Decode mismatch ====================
    /// The wire value kind cannot be decoded into the destination
    #[error("type mismatch: cannot decode {actual} into {expected}")]
    TypeMismatch {
        /// Destination kind
        expected: String,
        /// Wire value kind
        actual: String,
    },

    /// An error annotated with the field path it occurred at
    #[error("field {path}: {source}")]
    Field {
        /// Dotted field path, e.g. `Address.Lines[2]`
        path: String,
        /// Underlying error
        source: Box<Error>,
    },

    // ==================== Recursion ====================
    /// Nesting went deeper than the configured maximum
    #[error("nesting depth {depth} exceeds maximum of {max} levels")]
    RecursionLimitExceeded {
        /// Depth reached
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },

    // ==================== Protocol ====================
    /// A wire document does not have the expected shape
    #[error("malformed wire document: {reason}")]
    Wire {
        /// What was wrong
        reason: String,
    },

    // ==================== Transport ====================
    /// Failure reported by the transport collaborator
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    // ==================== Iteration ====================
    /// No cursor has been observed by the iterator yet
    #[error("cursor unavailable: no cursor has been observed yet")]
    CursorUnavailable,

    /// The request context was cancelled or its deadline passed
    #[error("operation cancelled")]
    Cancelled,

    // ==================== Configuration ====================
    /// Client configuration is missing or invalid
    #[error("configuration error: {reason}")]
    Config {
        /// What was wrong
        reason: String,
    },
}

impl Error {
    /// Create an UnsupportedType error
    pub fn unsupported(kind: impl Into<String>) -> Self {
        Error::UnsupportedType { kind: kind.into() }
    }

    /// Create a TypeMismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create an InvalidKey error
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Error::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create a Wire error
    pub fn wire(reason: impl Into<String>) -> Self {
        Error::Wire {
            reason: reason.into(),
        }
    }

    /// Create a Config error
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// Prefix the error's field path with a named field.
    pub fn at_field(self, name: &str) -> Self {
        self.prefixed(name.to_string())
    }

    /// Prefix the error's field path with a sequence index.
    pub fn at_index(self, index: usize) -> Self {
        self.prefixed(format!("[{index}]"))
    }

    fn prefixed(self, segment: String) -> Self {
        match self {
            Error::Field { path, source } => {
                let path = if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                Error::Field { path, source }
            }
            other => Error::Field {
                path: segment,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through field annotations.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoSuchEntity { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::wire(e.to_string())
    }
}

/// Failure reported by the transport collaborator.
///
/// Carried through [`Error::Transport`] without reinterpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// HTTP-style status code, when the transport has one
    pub status: Option<u16>,
    /// Transport-provided message
    pub message: String,
}

impl TransportError {
    /// Create a transport error without a status code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport error with a status code
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {status}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Positional errors of a multi-item operation.
///
/// Index `i` holds the error for item `i`, or `None` when that item was fine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiError(pub Vec<Option<Error>>);

impl MultiError {
    /// Create an error list with `len` empty slots
    pub fn with_len(len: usize) -> Self {
        MultiError(vec![None; len])
    }

    /// Number of items that failed
    pub fn failures(&self) -> usize {
        self.0.iter().filter(|e| e.is_some()).count()
    }

    /// True when no item failed
    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }

    /// Convert into a `Result`, failing when any slot holds an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(Error::Multi(self))
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut errors = self.0.iter().enumerate().filter_map(|(i, e)| e.as_ref().map(|e| (i, e)));
        match errors.next() {
            None => write!(f, "(0 errors)"),
            Some((index, first)) => {
                let rest = self.failures() - 1;
                match rest {
                    0 => write!(f, "item {index}: {first}"),
                    1 => write!(f, "item {index}: {first} (and 1 other error)"),
                    n => write!(f, "item {index}: {first} (and {n} other errors)"),
                }
            }
        }
    }
}
