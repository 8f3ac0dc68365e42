//! Property filters and the operator table

use grove_core::wire::value_to_json;
use grove_core::Value;
use once_cell::sync::Lazy;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

/// Pseudo-property naming an entity's key
pub const KEY_PROPERTY: &str = "__key__";

/// Caller spellings of comparison operators mapped to wire operator names.
static OPERATORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("=", "EQUAL"),
        ("==", "EQUAL"),
        ("<", "LESS_THAN"),
        ("<=", "LESS_THAN_OR_EQUAL"),
        (">", "GREATER_THAN"),
        (">=", "GREATER_THAN_OR_EQUAL"),
        ("!=", "NOT_EQUAL"),
        ("in", "IN"),
        ("not-in", "NOT_IN"),
        ("not in", "NOT_IN"),
    ])
});

/// Map a caller operator to its wire name.
///
/// Matching ignores surrounding whitespace and ASCII case. Operators not in
/// the table are returned unchanged so newer wire operators keep working.
pub fn canonical_operator(op: &str) -> String {
    match OPERATORS.get(op.trim().to_ascii_lowercase().as_str()) {
        Some(name) => (*name).to_string(),
        None => op.to_string(),
    }
}

/// One `property op value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Property name
    pub property: String,
    /// Wire operator name
    pub op: String,
    /// Encoded operand
    pub value: Value,
}

impl Filter {
    /// Create a filter, translating `op` through the operator table
    pub fn new(property: impl Into<String>, op: &str, value: Value) -> Self {
        Self {
            property: property.into(),
            op: canonical_operator(op),
            value,
        }
    }

    /// Render as a `propertyFilter` document
    pub fn to_json(&self) -> JsonValue {
        json!({
            "propertyFilter": {
                "property": {"name": self.property},
                "op": self.op,
                "value": value_to_json(&self.value),
            }
        })
    }
}
