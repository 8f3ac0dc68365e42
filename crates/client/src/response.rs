//! Response documents
//!
//! Typed views of the JSON bodies the store returns. Keys and values
//! deserialize through the wire mapping in `grove_core::wire`.
//!
//! Result entities stay raw JSON until their slot is decoded, so a
//! malformed entity fails only its own result with [`Error::Wire`].
//!
//! [`Error::Wire`]: grove_core::Error::Wire

use grove_core::wire::{json_to_entity, json_to_key};
use grove_core::{Cursor, Entity, Error, Key, Result, Value};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// One entity in a lookup or query response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResult {
    /// The entity document; for `missing` lookups only its key is set
    pub entity: JsonValue,
    /// Position just after this result
    #[serde(default)]
    pub cursor: Option<Cursor>,
    /// Store version of the entity
    #[serde(default)]
    pub version: Option<String>,
}

impl EntityResult {
    /// Key of the entity, parsed on its own.
    pub fn key(&self) -> Result<Key> {
        match self.entity.get("key") {
            None | Some(JsonValue::Null) => Err(Error::wire("result entity has no key")),
            Some(key) => json_to_key(key),
        }
    }

    /// Parse the full entity document.
    pub fn to_entity(&self) -> Result<Entity> {
        json_to_entity(&self.entity)
    }
}

/// Body of a `lookup` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    /// Entities that exist
    #[serde(default)]
    pub found: Vec<EntityResult>,
    /// Keys with no entity
    #[serde(default)]
    pub missing: Vec<EntityResult>,
    /// Keys the store did not get to; look them up again
    #[serde(default)]
    pub deferred: Vec<Key>,
}

/// Continuation status of a query batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoreResults {
    /// The batch ended early; more results may follow the end cursor
    NotFinished,
    /// The limit was reached
    MoreResultsAfterLimit,
    /// The end cursor was reached
    MoreResultsAfterCursor,
    /// The query is exhausted
    NoMoreResults,
    /// Status missing or not recognized
    #[default]
    #[serde(other)]
    MoreResultsTypeUnspecified,
}

impl MoreResults {
    /// True for the statuses that warrant fetching another batch
    pub fn has_more(&self) -> bool {
        matches!(
            self,
            MoreResults::NotFinished | MoreResults::MoreResultsAfterCursor
        )
    }
}

/// One batch of query results
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultBatch {
    /// Results in query order
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
    /// Continuation status
    #[serde(default)]
    pub more_results: MoreResults,
    /// Position after the last result
    #[serde(default)]
    pub end_cursor: Option<Cursor>,
    /// Results skipped to satisfy the offset
    #[serde(default)]
    pub skipped_results: u32,
}

/// Body of a `runQuery` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    /// The batch
    #[serde(default)]
    pub batch: QueryResultBatch,
}

/// Outcome of one mutation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    /// Store-assigned key, only for mutations of incomplete keys
    #[serde(default)]
    pub key: Option<Key>,
    /// Version after the mutation
    #[serde(default)]
    pub version: Option<String>,
}

/// Body of a `commit` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// One result per mutation, in request order
    #[serde(default)]
    pub mutation_results: Vec<MutationResult>,
    /// Number of index entries touched
    #[serde(default)]
    pub index_updates: Option<i64>,
}

/// Body of an `allocateIds` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocateIdsResponse {
    /// Completed keys, in request order
    #[serde(default)]
    pub keys: Vec<Key>,
}

/// One aggregation row
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Aggregate values by alias
    #[serde(default)]
    pub aggregate_properties: BTreeMap<String, Value>,
}

/// Batch of aggregation rows
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResultBatch {
    /// Rows
    #[serde(default)]
    pub aggregation_results: Vec<AggregationResult>,
}

/// Body of a `runAggregationQuery` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregationResponse {
    /// The batch
    #[serde(default)]
    pub batch: AggregationResultBatch,
}
