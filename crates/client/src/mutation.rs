//! Commit mutations
//!
//! | Mutation | Key | Value |
//! |----------|-----|-------|
//! | insert | complete or incomplete | required |
//! | update | complete | required |
//! | upsert | complete or incomplete | required |
//! | delete | complete | none |
//!
//! Constructors validate the key and encode the value, so a `Mutation` that
//! exists is always well formed.

use grove_codec::Document;
use grove_core::wire::{entity_to_json, key_to_json};
use grove_core::{Entity, Key, Result};
use serde_json::{Map, Value as JsonValue};

/// One write in a commit
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create; fails in the store if the entity exists
    Insert(Entity),
    /// Replace; fails in the store if the entity does not exist
    Update(Entity),
    /// Create or replace
    Upsert(Entity),
    /// Remove; succeeds whether or not the entity exists
    Delete(Key),
}

impl Mutation {
    /// Insert `value` under `key`
    pub fn insert<T: Document>(key: Key, value: &T) -> Result<Self> {
        key.validate()?;
        Ok(Mutation::Insert(value.to_entity(Some(key))?))
    }

    /// Update the entity under the complete `key`
    pub fn update<T: Document>(key: Key, value: &T) -> Result<Self> {
        key.validate_complete()?;
        Ok(Mutation::Update(value.to_entity(Some(key))?))
    }

    /// Insert or replace `value` under `key`
    pub fn upsert<T: Document>(key: Key, value: &T) -> Result<Self> {
        key.validate()?;
        Ok(Mutation::Upsert(value.to_entity(Some(key))?))
    }

    /// Delete the entity under the complete `key`
    pub fn delete(key: Key) -> Result<Self> {
        key.validate_complete()?;
        Ok(Mutation::Delete(key))
    }

    /// Key the mutation applies to
    pub fn key(&self) -> Option<&Key> {
        match self {
            Mutation::Insert(e) | Mutation::Update(e) | Mutation::Upsert(e) => e.key.as_ref(),
            Mutation::Delete(k) => Some(k),
        }
    }

    /// Wire operation name
    pub fn op(&self) -> &'static str {
        match self {
            Mutation::Insert(_) => "insert",
            Mutation::Update(_) => "update",
            Mutation::Upsert(_) => "upsert",
            Mutation::Delete(_) => "delete",
        }
    }

    /// Render as a mutation document
    pub fn to_json(&self) -> JsonValue {
        let body = match self {
            Mutation::Insert(e) | Mutation::Update(e) | Mutation::Upsert(e) => entity_to_json(e),
            Mutation::Delete(k) => key_to_json(k),
        };
        let mut doc = Map::new();
        doc.insert(self.op().to_string(), body);
        JsonValue::Object(doc)
    }
}
