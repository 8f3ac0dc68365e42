//! Record codec
//!
//! A [`Record`] is a Rust struct described by a [`Schema`]. Encoding walks
//! the schema and emits one property per value field, merging embedded and
//! flattened records into the same property map. Decoding starts from
//! `Default` and fills every field whose property is present; properties
//! without a destination field are ignored.
//!
//! Records nested as values (a field of record type that is neither embedded
//! nor flattened) become embedded entities. Opt a record into that with
//! [`entity_value!`](crate::entity_value).

use crate::schema::Schema;
use grove_core::{check_depth, Entity, Error, Key, Property, Result, Value};
use std::collections::BTreeMap;

pub(crate) type Properties = BTreeMap<String, Property>;

/// A struct with a schema descriptor.
pub trait Record: Default + 'static {
    /// The schema shared by every encode and decode of this type.
    fn schema() -> &'static Schema<Self>;
}

pub(crate) fn encode_fields<T: Record>(
    record: &T,
    prefix: &str,
    no_index: bool,
    depth: usize,
    out: &mut Properties,
) -> Result<()> {
    check_depth(depth)?;
    let schema = T::schema();
    schema.check()?;
    for field in schema.fields() {
        field
            .encode(record, prefix, no_index, depth, out)
            .map_err(|e| e.at_field(field.name()))?;
    }
    Ok(())
}

pub(crate) fn decode_fields<T: Record>(
    record: &mut T,
    props: &Properties,
    prefix: &str,
    depth: usize,
) -> Result<()> {
    check_depth(depth)?;
    let schema = T::schema();
    schema.check()?;
    for field in schema.fields() {
        field
            .decode(record, props, prefix, depth)
            .map_err(|e| e.at_field(field.name()))?;
    }
    Ok(())
}

/// Encode a record into an entity under `key`.
pub fn encode_entity<T: Record>(record: &T, key: Option<Key>) -> Result<Entity> {
    let mut properties = Properties::new();
    encode_fields(record, "", false, 0, &mut properties)?;
    Ok(Entity { key, properties })
}

/// Decode a record from an entity's properties; the key is not consulted.
pub fn decode_entity<T: Record>(entity: &Entity) -> Result<T> {
    let mut record = T::default();
    decode_fields(&mut record, &entity.properties, "", 0)?;
    Ok(record)
}

/// Encode a record nested as a value at `depth`.
pub fn encode_embedded<T: Record>(record: &T, depth: usize) -> Result<Value> {
    let mut properties = Properties::new();
    encode_fields(record, "", false, depth, &mut properties)?;
    Ok(Value::Entity(Entity {
        key: None,
        properties,
    }))
}

/// Decode a record nested as a value at `depth`.
pub fn decode_embedded<T: Record>(value: &Value, depth: usize) -> Result<T> {
    let mut record = T::default();
    match value {
        Value::Entity(entity) => decode_fields(&mut record, &entity.properties, "", depth)?,
        Value::Null => check_depth(depth)?,
        other => return Err(Error::type_mismatch(T::schema().name(), other.type_name())),
    }
    Ok(record)
}

/// Anything that converts to and from a keyed entity.
///
/// Implemented for every [`Record`] and for [`Entity`] itself.
pub trait Document: Sized {
    /// Encode under `key`.
    fn to_entity(&self, key: Option<Key>) -> Result<Entity>;

    /// Decode from a stored entity.
    fn from_entity(entity: &Entity) -> Result<Self>;
}

impl<T: Record> Document for T {
    fn to_entity(&self, key: Option<Key>) -> Result<Entity> {
        encode_entity(self, key)
    }

    fn from_entity(entity: &Entity) -> Result<Self> {
        decode_entity(entity)
    }
}

impl Document for Entity {
    fn to_entity(&self, key: Option<Key>) -> Result<Entity> {
        Ok(Entity {
            key: key.or_else(|| self.key.clone()),
            properties: self.properties.clone(),
        })
    }

    fn from_entity(entity: &Entity) -> Result<Self> {
        Ok(entity.clone())
    }
}

/// Implement [`Encode`](crate::Encode) and [`Decode`](crate::Decode) for
/// record types so they can be nested as embedded-entity values.
#[macro_export]
macro_rules! entity_value {
    ($($t:ty),+ $(,)?) => {$(
        impl $crate::Encode for $t {
            fn encode(&self, depth: usize) -> $crate::Result<$crate::Value> {
                $crate::encode_embedded(self, depth)
            }
        }

        impl $crate::Decode for $t {
            fn decode(value: &$crate::Value, depth: usize) -> $crate::Result<Self> {
                $crate::decode_embedded(value, depth)
            }
        }
    )+};
}
