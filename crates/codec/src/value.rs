//! Value codec
//!
//! [`Encode`] maps a Rust value onto the typed property union and [`Decode`]
//! maps it back. Dispatch is static: each supported kind has one impl.
//!
//! | Rust kind | Typed value |
//! |-----------|-------------|
//! | `bool` | boolean |
//! | integers (`i8`..`u64`, `isize`, `usize`) | integer, overflow past `i64` fails |
//! | `f32`, `f64` | double |
//! | `String`, `str` | string |
//! | `DateTime<Utc>` | timestamp |
//! | `Key` | key reference |
//! | `Vec<u8>`, `[u8; N]`, `[u8]` | blob |
//! | other sequences | array, order preserved |
//! | `Option<T>` | `None` is null |
//! | records (via `entity_value!`) | embedded entity |
//!
//! Maps and `()` implement the traits only to fail with
//! [`Error::UnsupportedType`]; everything else is rejected at compile time.
//!
//! `null` decodes to the destination's `Default`.

use chrono::{DateTime, Utc};
use grove_core::{check_depth, Entity, Error, Key, Result, Value};
use std::collections::{BTreeMap, HashMap};

/// Conversion of a Rust value into a typed property value.
pub trait Encode {
    /// Encode at nesting `depth` (0 for a top-level value).
    fn encode(&self, depth: usize) -> Result<Value>;

    /// Emptiness as seen by `omitempty`.
    fn is_empty_value(&self) -> bool {
        false
    }

    /// Encode a sequence of `Self`.
    ///
    /// Sequences become arrays; byte sequences override this to become blobs.
    fn encode_seq(items: &[Self], depth: usize) -> Result<Value>
    where
        Self: Sized,
    {
        check_depth(depth)?;
        let values = items
            .iter()
            .enumerate()
            .map(|(i, item)| item.encode(depth + 1).map_err(|e| e.at_index(i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(values))
    }
}

/// Conversion of a typed property value into a Rust value.
pub trait Decode: Sized {
    /// Decode at nesting `depth` (0 for a top-level value).
    fn decode(value: &Value, depth: usize) -> Result<Self>;

    /// Decode a sequence of `Self`.
    fn decode_seq(value: &Value, depth: usize) -> Result<Vec<Self>> {
        check_depth(depth)?;
        match value {
            Value::Array(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| Self::decode(v, depth + 1).map_err(|e| e.at_index(i)))
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::type_mismatch("sequence", other.type_name())),
        }
    }
}

/// Encode a top-level value.
pub fn encode_value<T: Encode + ?Sized>(value: &T) -> Result<Value> {
    value.encode(0)
}

/// Decode a top-level value.
pub fn decode_value<T: Decode>(value: &Value) -> Result<T> {
    T::decode(value, 0)
}

// ============================================================================
// Scalars
// ============================================================================

impl Encode for bool {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::Boolean(*self))
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }
}

impl Decode for bool {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Null => Ok(false),
            other => Err(Error::type_mismatch("bool", other.type_name())),
        }
    }
}

macro_rules! impl_integer {
    ($($t:ty),+) => {$(
        impl Encode for $t {
            fn encode(&self, _depth: usize) -> Result<Value> {
                i64::try_from(*self)
                    .map(Value::Integer)
                    .map_err(|_| Error::IntegerOverflow {
                        value: self.to_string(),
                        target: "i64",
                    })
            }

            fn is_empty_value(&self) -> bool {
                *self == 0
            }
        }

        impl Decode for $t {
            fn decode(value: &Value, _depth: usize) -> Result<Self> {
                match value {
                    Value::Integer(i) => <$t>::try_from(*i).map_err(|_| Error::IntegerOverflow {
                        value: i.to_string(),
                        target: stringify!($t),
                    }),
                    Value::Null => Ok(0),
                    other => Err(Error::type_mismatch(stringify!($t), other.type_name())),
                }
            }
        }
    )+};
}

impl_integer!(i8, i16, i32, i64, isize, u16, u32, u64, usize);

// u8 is an integer on its own and a blob in sequences.
impl Encode for u8 {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::Integer(i64::from(*self)))
    }

    fn is_empty_value(&self) -> bool {
        *self == 0
    }

    fn encode_seq(items: &[Self], _depth: usize) -> Result<Value> {
        Ok(Value::Blob(items.to_vec()))
    }
}

impl Decode for u8 {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Integer(i) => u8::try_from(*i).map_err(|_| Error::IntegerOverflow {
                value: i.to_string(),
                target: "u8",
            }),
            Value::Null => Ok(0),
            other => Err(Error::type_mismatch("u8", other.type_name())),
        }
    }

    fn decode_seq(value: &Value, _depth: usize) -> Result<Vec<Self>> {
        match value {
            Value::Blob(bytes) => Ok(bytes.clone()),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::type_mismatch("bytes", other.type_name())),
        }
    }
}

impl Encode for f64 {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::Double(*self))
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl Decode for f64 {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Double(d) => Ok(*d),
            Value::Null => Ok(0.0),
            other => Err(Error::type_mismatch("f64", other.type_name())),
        }
    }
}

impl Encode for f32 {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::Double(f64::from(*self)))
    }

    fn is_empty_value(&self) -> bool {
        *self == 0.0
    }
}

impl Decode for f32 {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Double(d) => Ok(*d as f32),
            Value::Null => Ok(0.0),
            other => Err(Error::type_mismatch("f32", other.type_name())),
        }
    }
}

impl Encode for str {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Encode for String {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl Decode for String {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            other => Err(Error::type_mismatch("string", other.type_name())),
        }
    }
}

impl Encode for DateTime<Utc> {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::Timestamp(*self))
    }

    fn is_empty_value(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

impl Decode for DateTime<Utc> {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Timestamp(t) => Ok(*t),
            Value::Null => Ok(DateTime::<Utc>::default()),
            other => Err(Error::type_mismatch("timestamp", other.type_name())),
        }
    }
}

impl Encode for Key {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Ok(Value::Key(self.clone()))
    }
}

impl Decode for Key {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Key(k) => Ok(k.clone()),
            Value::Null => Ok(Key::default()),
            other => Err(Error::type_mismatch("key", other.type_name())),
        }
    }
}

// Raw values and entities pass through unchanged.

impl Encode for Value {
    fn encode(&self, depth: usize) -> Result<Value> {
        check_depth(depth)?;
        Ok(self.clone())
    }

    fn is_empty_value(&self) -> bool {
        self.is_null()
    }
}

impl Decode for Value {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        Ok(value.clone())
    }
}

impl Encode for Entity {
    fn encode(&self, depth: usize) -> Result<Value> {
        check_depth(depth)?;
        Ok(Value::Entity(Entity {
            key: None,
            properties: self.properties.clone(),
        }))
    }
}

impl Decode for Entity {
    fn decode(value: &Value, _depth: usize) -> Result<Self> {
        match value {
            Value::Entity(e) => Ok(e.clone()),
            Value::Null => Ok(Entity::default()),
            other => Err(Error::type_mismatch("entity", other.type_name())),
        }
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, depth: usize) -> Result<Value> {
        match self {
            Some(v) => v.encode(depth),
            None => Ok(Value::Null),
        }
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &Value, depth: usize) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other, depth).map(Some),
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, depth: usize) -> Result<Value> {
        T::encode_seq(self, depth)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value, depth: usize) -> Result<Self> {
        T::decode_seq(value, depth)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, depth: usize) -> Result<Value> {
        T::encode_seq(self, depth)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, depth: usize) -> Result<Value> {
        T::encode_seq(self, depth)
    }

    fn is_empty_value(&self) -> bool {
        N == 0
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(value: &Value, depth: usize) -> Result<Self> {
        let items = T::decode_seq(value, depth)?;
        let len = items.len();
        items
            .try_into()
            .map_err(|_| Error::type_mismatch(format!("array of length {N}"), format!("array of length {len}")))
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, depth: usize) -> Result<Value> {
        (**self).encode(depth)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, depth: usize) -> Result<Value> {
        (**self).encode(depth)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(value: &Value, depth: usize) -> Result<Self> {
        T::decode(value, depth).map(Box::new)
    }
}

// ============================================================================
// Unsupported kinds
// ============================================================================

impl Encode for () {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Err(Error::unsupported("()"))
    }
}

impl Decode for () {
    fn decode(_value: &Value, _depth: usize) -> Result<Self> {
        Err(Error::unsupported("()"))
    }
}

impl<K, V, S> Encode for HashMap<K, V, S> {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Err(Error::unsupported(std::any::type_name::<Self>()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Decode for HashMap<K, V, S> {
    fn decode(_value: &Value, _depth: usize) -> Result<Self> {
        Err(Error::unsupported(std::any::type_name::<Self>()))
    }
}

impl<K, V> Encode for BTreeMap<K, V> {
    fn encode(&self, _depth: usize) -> Result<Value> {
        Err(Error::unsupported(std::any::type_name::<Self>()))
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Decode for BTreeMap<K, V> {
    fn decode(_value: &Value, _depth: usize) -> Result<Self> {
        Err(Error::unsupported(std::any::type_name::<Self>()))
    }
}
