//! JSON wire mapping for values, keys and entities.
//!
//! The store speaks JSON with explicit type tags. This module converts the
//! typed model to and from `serde_json::Value` documents:
//!
//! | Model | JSON Representation |
//! |-------|---------------------|
//! | `Value::Null` | `{"nullValue": null}` |
//! | `Value::Integer(7)` | `{"integerValue": "7"}` |
//! | `Value::Double(NaN)` | `{"doubleValue": "NaN"}` |
//! | `Value::Timestamp` | `{"timestampValue": "2024-01-02T03:04:05.000000006Z"}` |
//! | `Value::Blob` | `{"blobValue": "<base64>"}` |
//! | `Value::Array` | `{"arrayValue": {"values": [...]}}` |
//! | `Value::Entity` | `{"entityValue": {"properties": {...}}}` |
//! | `Key` | `{"partitionId": {...}, "path": [{"kind", "name"|"id"}]}` |
//!
//! Decoding is lenient where producers are known to differ: integers and key
//! ids are accepted as decimal strings or JSON numbers, and a missing
//! `values` field decodes as an empty array.

use crate::entity::{Entity, Property};
use crate::error::{Error, Result};
use crate::key::{Key, KeyId, PathElement};
use crate::limits::check_depth;
use crate::value::Value;
use base64::{engine::general_purpose::STANDARD as BASE64, engine::general_purpose::URL_SAFE as BASE64_URL, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};

/// Property name flagging a value as excluded from indexes
pub const EXCLUDE_FROM_INDEXES: &str = "excludeFromIndexes";

const VALUE_TAGS: [&str; 10] = [
    "nullValue",
    "booleanValue",
    "integerValue",
    "doubleValue",
    "timestampValue",
    "stringValue",
    "blobValue",
    "keyValue",
    "arrayValue",
    "entityValue",
];

// ============================================================================
// Values
// ============================================================================

/// Convert a Value to its tagged JSON form.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Boolean(b) => json!({ "booleanValue": b }),
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::Double(f) => json!({ "doubleValue": double_to_json(*f) }),
        Value::Timestamp(t) => json!({ "timestampValue": format_timestamp(t) }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Blob(b) => json!({ "blobValue": BASE64.encode(b) }),
        Value::Key(k) => json!({ "keyValue": key_to_json(k) }),
        Value::Array(items) => {
            let values: Vec<JsonValue> = items.iter().map(value_to_json).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Entity(e) => json!({ "entityValue": entity_to_json(e) }),
    }
}

/// Convert a Property to JSON, attaching the index-exclusion flag.
///
/// The store rejects the flag on an array value itself, so for arrays it is
/// placed on every element instead.
pub fn property_to_json(property: &Property) -> JsonValue {
    if !property.exclude_from_indexes {
        return value_to_json(&property.value);
    }
    match &property.value {
        Value::Array(items) => {
            let values: Vec<JsonValue> = items
                .iter()
                .map(|v| with_exclusion(value_to_json(v)))
                .collect();
            json!({ "arrayValue": { "values": values } })
        }
        other => with_exclusion(value_to_json(other)),
    }
}

fn with_exclusion(mut doc: JsonValue) -> JsonValue {
    if let JsonValue::Object(obj) = &mut doc {
        obj.insert(EXCLUDE_FROM_INDEXES.to_string(), JsonValue::Bool(true));
    }
    doc
}

/// Convert a tagged JSON document to a Value.
pub fn json_to_value(json: &JsonValue) -> Result<Value> {
    json_to_value_at(json, 0)
}

fn json_to_value_at(json: &JsonValue, depth: usize) -> Result<Value> {
    check_depth(depth)?;
    let obj = json
        .as_object()
        .ok_or_else(|| Error::wire(format!("value must be an object, got {json}")))?;

    let mut tags = VALUE_TAGS.iter().filter(|tag| obj.contains_key(**tag));
    let tag = match (tags.next(), tags.next()) {
        (Some(tag), None) => *tag,
        (None, _) => return Err(Error::wire("value carries no type tag")),
        (Some(a), Some(b)) => {
            return Err(Error::wire(format!("value carries both {a} and {b}")));
        }
    };
    let raw = &obj[tag];

    match tag {
        "nullValue" => match raw {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::String(s) if s == "NULL_VALUE" => Ok(Value::Null),
            other => Err(Error::wire(format!("invalid nullValue {other}"))),
        },
        "booleanValue" => raw
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| Error::wire(format!("invalid booleanValue {raw}"))),
        "integerValue" => parse_integer(raw).map(Value::Integer),
        "doubleValue" => parse_double(raw).map(Value::Double),
        "timestampValue" => {
            let s = raw
                .as_str()
                .ok_or_else(|| Error::wire(format!("invalid timestampValue {raw}")))?;
            parse_timestamp(s).map(Value::Timestamp)
        }
        "stringValue" => raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| Error::wire(format!("invalid stringValue {raw}"))),
        "blobValue" => {
            let s = raw
                .as_str()
                .ok_or_else(|| Error::wire(format!("invalid blobValue {raw}")))?;
            decode_base64(s).map(Value::Blob)
        }
        "keyValue" => json_to_key(raw).map(Value::Key),
        "arrayValue" => {
            let values = match raw.get("values") {
                None | Some(JsonValue::Null) => return Ok(Value::Array(Vec::new())),
                Some(JsonValue::Array(values)) => values,
                Some(other) => {
                    return Err(Error::wire(format!("arrayValue.values must be an array, got {other}")))
                }
            };
            let items: Result<Vec<Value>> =
                values.iter().map(|v| json_to_value_at(v, depth + 1)).collect();
            Ok(Value::Array(items?))
        }
        "entityValue" => json_to_entity_at(raw, depth + 1).map(Value::Entity),
        other => Err(Error::wire(format!("unhandled value tag {other}"))),
    }
}

/// Convert a JSON document to a Property, reading the index-exclusion flag.
///
/// For arrays the flag is taken from the elements when the array itself does
/// not carry it.
pub fn json_to_property(json: &JsonValue) -> Result<Property> {
    json_to_property_at(json, 0)
}

fn json_to_property_at(json: &JsonValue, depth: usize) -> Result<Property> {
    let value = json_to_value_at(json, depth)?;
    let mut excluded = exclusion_flag(json);
    if !excluded {
        if let Some(values) = json
            .get("arrayValue")
            .and_then(|a| a.get("values"))
            .and_then(JsonValue::as_array)
        {
            excluded = !values.is_empty() && values.iter().all(exclusion_flag);
        }
    }
    Ok(Property {
        value,
        exclude_from_indexes: excluded,
    })
}

fn exclusion_flag(json: &JsonValue) -> bool {
    json.get(EXCLUDE_FROM_INDEXES)
        .and_then(JsonValue::as_bool)
        .unwrap_or(false)
}

fn parse_integer(raw: &JsonValue) -> Result<i64> {
    match raw {
        JsonValue::String(s) => s
            .parse::<i64>()
            .map_err(|e| Error::wire(format!("invalid integerValue {s:?}: {e}"))),
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::wire(format!("integerValue {n} is not a 64-bit integer"))),
        other => Err(Error::wire(format!("invalid integerValue {other}"))),
    }
}

fn parse_double(raw: &JsonValue) -> Result<f64> {
    match raw {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::wire(format!("invalid doubleValue {n}"))),
        JsonValue::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse::<f64>()
                .map_err(|e| Error::wire(format!("invalid doubleValue {other:?}: {e}"))),
        },
        other => Err(Error::wire(format!("invalid doubleValue {other}"))),
    }
}

/// JSON has no literal for NaN or the infinities; they travel as strings.
fn double_to_json(f: f64) -> JsonValue {
    if f.is_nan() {
        JsonValue::String("NaN".to_string())
    } else if f == f64::INFINITY {
        JsonValue::String("Infinity".to_string())
    } else if f == f64::NEG_INFINITY {
        JsonValue::String("-Infinity".to_string())
    } else {
        json!(f)
    }
}

/// Format an instant as RFC 3339 with nanoseconds and a `Z` suffix.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an RFC 3339 instant with any offset.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::wire(format!("invalid timestamp {s:?}: {e}")))
}

fn decode_base64(s: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(s)
        .or_else(|_| BASE64_URL.decode(s))
        .map_err(|e| Error::wire(format!("invalid base64: {e}")))
}

// ============================================================================
// Keys
// ============================================================================

/// Convert a Key to its path document.
pub fn key_to_json(key: &Key) -> JsonValue {
    let path: Vec<JsonValue> = key
        .path()
        .iter()
        .map(|element| {
            let mut seg = Map::new();
            seg.insert("kind".to_string(), JsonValue::String(element.kind.clone()));
            match &element.id {
                Some(KeyId::Name(name)) => {
                    seg.insert("name".to_string(), JsonValue::String(name.clone()));
                }
                Some(KeyId::Id(id)) => {
                    seg.insert("id".to_string(), JsonValue::String(id.to_string()));
                }
                None => {}
            }
            JsonValue::Object(seg)
        })
        .collect();

    let mut doc = Map::new();
    if let Some(partition) = partition_to_json(key.project_id(), key.namespace()) {
        doc.insert("partitionId".to_string(), partition);
    }
    doc.insert("path".to_string(), JsonValue::Array(path));
    JsonValue::Object(doc)
}

/// Render a `partitionId` document, `None` when both parts are absent.
pub fn partition_to_json(project_id: Option<&str>, namespace: Option<&str>) -> Option<JsonValue> {
    if project_id.is_none() && namespace.is_none() {
        return None;
    }
    let mut partition = Map::new();
    if let Some(project) = project_id {
        partition.insert("projectId".to_string(), JsonValue::String(project.to_string()));
    }
    if let Some(ns) = namespace {
        partition.insert("namespaceId".to_string(), JsonValue::String(ns.to_string()));
    }
    Some(JsonValue::Object(partition))
}

/// Convert a path document to a Key.
///
/// Segment ids may be decimal strings or JSON integers. Integers are read
/// exactly; a non-integral number is rejected rather than rounded.
pub fn json_to_key(json: &JsonValue) -> Result<Key> {
    let path = json
        .get("path")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Error::wire("key document has no path array"))?;

    let mut elements = Vec::with_capacity(path.len());
    for (i, seg) in path.iter().enumerate() {
        let kind = seg
            .get("kind")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::wire(format!("key path segment {i} has no kind")))?;
        let id = match (seg.get("name"), seg.get("id")) {
            (Some(JsonValue::String(name)), None) => Some(KeyId::Name(name.clone())),
            (None, Some(raw)) => Some(KeyId::Id(parse_key_id(raw)?)),
            (None, None) => None,
            _ => {
                return Err(Error::wire(format!(
                    "key path segment {i} must carry exactly one of name or id"
                )))
            }
        };
        elements.push(PathElement {
            kind: kind.to_string(),
            id,
        });
    }

    let mut key = Key::from_path(elements);
    if let Some(partition) = json.get("partitionId") {
        if let Some(project) = partition.get("projectId").and_then(JsonValue::as_str) {
            key = key.with_project(project);
        }
        if let Some(ns) = partition.get("namespaceId").and_then(JsonValue::as_str) {
            key = key.with_namespace(ns);
        }
    }
    Ok(key)
}

fn parse_key_id(raw: &JsonValue) -> Result<i64> {
    match raw {
        JsonValue::String(s) => s
            .parse::<i64>()
            .map_err(|e| Error::wire(format!("invalid key id {s:?}: {e}"))),
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::wire(format!("key id {n} is not an exact 64-bit integer"))),
        other => Err(Error::wire(format!("invalid key id {other}"))),
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Convert an Entity to its `{key?, properties}` document.
pub fn entity_to_json(entity: &Entity) -> JsonValue {
    let properties: Map<String, JsonValue> = entity
        .properties
        .iter()
        .map(|(name, property)| (name.clone(), property_to_json(property)))
        .collect();
    let mut doc = Map::new();
    if let Some(key) = &entity.key {
        doc.insert("key".to_string(), key_to_json(key));
    }
    doc.insert("properties".to_string(), JsonValue::Object(properties));
    JsonValue::Object(doc)
}

/// Convert an entity document to an Entity.
pub fn json_to_entity(json: &JsonValue) -> Result<Entity> {
    json_to_entity_at(json, 0)
}

fn json_to_entity_at(json: &JsonValue, depth: usize) -> Result<Entity> {
    check_depth(depth)?;
    if !json.is_object() {
        return Err(Error::wire(format!("entity must be an object, got {json}")));
    }
    let key = match json.get("key") {
        None | Some(JsonValue::Null) => None,
        Some(k) => Some(json_to_key(k)?),
    };
    let mut entity = Entity {
        key,
        ..Entity::default()
    };
    match json.get("properties") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Object(props)) => {
            for (name, raw) in props {
                let property = json_to_property_at(raw, depth)
                    .map_err(|e| e.at_field(name))?;
                entity.properties.insert(name.clone(), property);
            }
        }
        Some(other) => {
            return Err(Error::wire(format!("entity properties must be an object, got {other}")))
        }
    }
    Ok(entity)
}

// ============================================================================
// serde integration
// ============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        value_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        json_to_value(&json).map_err(de::Error::custom)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        key_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        json_to_key(&json).map_err(de::Error::custom)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        entity_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = JsonValue::deserialize(deserializer)?;
        json_to_entity(&json).map_err(de::Error::custom)
    }
}
