//! Typed property values
//!
//! [`Value`] is the typed-value union of the store protocol. Exactly one
//! variant is populated; each variant corresponds to one wire tag:
//!
//! | Variant | Wire tag |
//! |---------|----------|
//! | `Null` | `nullValue` |
//! | `Boolean` | `booleanValue` |
//! | `Integer` | `integerValue` (decimal string) |
//! | `Double` | `doubleValue` |
//! | `Timestamp` | `timestampValue` (RFC 3339, nanoseconds) |
//! | `String` | `stringValue` |
//! | `Blob` | `blobValue` (base64) |
//! | `Key` | `keyValue` |
//! | `Array` | `arrayValue` |
//! | `Entity` | `entityValue` |
//!
//! Different variants are never equal: `Integer(1) != Double(1.0)` and
//! `Blob(b"a") != String("a")`.

use crate::entity::Entity;
use crate::key::Key;
use chrono::{DateTime, Utc};

/// Typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point (IEEE-754)
    Double(f64),
    /// Absolute instant with nanosecond precision
    Timestamp(DateTime<Utc>),
    /// UTF-8 string
    String(String),
    /// Opaque bytes
    Blob(Vec<u8>),
    /// Reference to another entity
    Key(Key),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Nested property mapping without a key of its own
    Entity(Entity),
}

impl Value {
    /// Name of the wire tag for this variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "nullValue",
            Value::Boolean(_) => "booleanValue",
            Value::Integer(_) => "integerValue",
            Value::Double(_) => "doubleValue",
            Value::Timestamp(_) => "timestampValue",
            Value::String(_) => "stringValue",
            Value::Blob(_) => "blobValue",
            Value::Key(_) => "keyValue",
            Value::Array(_) => "arrayValue",
            Value::Entity(_) => "entityValue",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Double value
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Blob value
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &Key if this is a Key value
    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Value::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Get as &[Value] if this is an Array value
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get as &Entity if this is an Entity value
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self {
        Value::Key(k)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}

impl From<Entity> for Value {
    fn from(e: Entity) -> Self {
        Value::Entity(e)
    }
}
