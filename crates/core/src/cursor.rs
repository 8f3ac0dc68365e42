//! Query cursors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque continuation token marking a position in a result stream.
///
/// Equality is by value. The empty token means "no cursor".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a token received from the store
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty token
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Cursor::new(s)
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Cursor(s)
    }
}
