//! Entities and properties
//!
//! An [`Entity`] is an optional [`Key`] plus a mapping from property name to
//! [`Property`]. Top-level entities carry a key; embedded entities (values
//! nested inside another entity) do not.

use crate::key::Key;
use crate::value::Value;
use std::collections::BTreeMap;

/// A typed value plus its index-exclusion flag
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// The typed value
    pub value: Value,
    /// When set, the store does not index this property
    pub exclude_from_indexes: bool,
}

impl Property {
    /// Indexed property
    pub fn new(value: Value) -> Self {
        Self {
            value,
            exclude_from_indexes: false,
        }
    }

    /// Property excluded from indexes
    pub fn unindexed(value: Value) -> Self {
        Self {
            value,
            exclude_from_indexes: true,
        }
    }
}

/// Keyed (or embedded) property document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    /// Key, absent for embedded entities
    pub key: Option<Key>,
    /// Properties by name
    pub properties: BTreeMap<String, Property>,
}

impl Entity {
    /// Empty entity under `key`
    pub fn new(key: Key) -> Self {
        Self {
            key: Some(key),
            properties: BTreeMap::new(),
        }
    }

    /// Empty embedded entity
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Insert or replace an indexed property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), Property::new(value.into()));
    }

    /// Insert or replace a property with an explicit index flag.
    pub fn set_property(&mut self, name: impl Into<String>, property: Property) {
        self.properties.insert(name.into(), property);
    }

    /// Look up a property value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).map(|p| &p.value)
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// True when the entity has no properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Attach a key, replacing any existing one
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }
}
