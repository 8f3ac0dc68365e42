//! Query builder
//!
//! Each builder call consumes the query and returns it, so queries read as a
//! chain:
//!
//! ```ignore
//! let q = Query::new("Task")
//!     .filter("Done", "=", false)
//!     .filter("Priority", ">=", 4)
//!     .order("-Created")
//!     .limit(10);
//! ```
//!
//! Operand encoding errors do not interrupt the chain. The first one is kept
//! and returned by [`Query::render`].
//!
//! ## Rendering
//!
//! | State | Rendered |
//! |-------|----------|
//! | no filters | no `filter` |
//! | one filter | a single `propertyFilter` |
//! | two or more | an `AND` `compositeFilter` |
//! | ancestor | extra `HAS_ANCESTOR` filter on `__key__`, AND-composed |
//! | projection | `projection`, wins over keys-only |
//! | keys-only | `projection` of `__key__` |
//! | limit / offset | only when > 0 |
//! | cursors | only when non-empty |

use crate::filter::{Filter, KEY_PROPERTY};
use crate::order::Order;
use grove_codec::{encode_value, Encode};
use grove_core::{Cursor, Error, Key, Result, Value};
use serde_json::{json, Map, Value as JsonValue};
use tracing::trace;

/// Alias of the count aggregation in rendered aggregation queries
pub const COUNT_ALIAS: &str = "total";

/// Structured query over one kind
#[derive(Debug, Clone, Default)]
pub struct Query {
    kind: String,
    namespace: Option<String>,
    ancestor: Option<Key>,
    filters: Vec<Filter>,
    orders: Vec<Order>,
    projection: Vec<String>,
    distinct_on: Vec<String>,
    limit: u32,
    offset: u32,
    start_cursor: Cursor,
    end_cursor: Cursor,
    keys_only: bool,
    error: Option<Error>,
}

impl Query {
    /// Query entities of `kind`; an empty kind queries every kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    fn defer(mut self, error: Error) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    /// Restrict to a namespace (empty string means the default namespace)
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// Restrict to descendants of `ancestor`, which must be complete.
    pub fn ancestor(mut self, ancestor: Key) -> Self {
        if let Err(e) = ancestor.validate_complete() {
            return self.defer(e);
        }
        self.ancestor = Some(ancestor);
        self
    }

    /// Add a `property op value` filter.
    ///
    /// `op` goes through the operator table (`=`, `<`, `>=`, `!=`, `in`, ...);
    /// unknown operators are sent as given.
    pub fn filter(mut self, property: impl Into<String>, op: &str, value: impl Encode) -> Self {
        let property = property.into();
        match encode_value(&value) {
            Ok(value) => {
                self.filters.push(Filter::new(property, op, value));
                self
            }
            Err(e) => self.defer(e.at_field(&property)),
        }
    }

    /// Add an ordering; a leading `-` sorts descending.
    pub fn order(mut self, field: &str) -> Self {
        self.orders.push(Order::parse(field));
        self
    }

    /// Return only the named properties
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Deduplicate on the projection fields set so far.
    ///
    /// Fields projected after this call are not included.
    pub fn distinct(mut self) -> Self {
        self.distinct_on = self.projection.clone();
        self
    }

    /// Deduplicate on explicit fields
    pub fn distinct_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct_on = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Return at most `limit` results (0 means unlimited)
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Skip the first `offset` results
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Start after the given cursor
    pub fn start(mut self, cursor: Cursor) -> Self {
        self.start_cursor = cursor;
        self
    }

    /// Stop at the given cursor
    pub fn end(mut self, cursor: Cursor) -> Self {
        self.end_cursor = cursor;
        self
    }

    /// Return keys without properties
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Entity kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Namespace the query runs in
    pub fn partition_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True for keys-only queries
    pub fn is_keys_only(&self) -> bool {
        self.keys_only
    }

    /// Result limit, 0 when unlimited
    pub fn limit_value(&self) -> u32 {
        self.limit
    }

    /// Result offset
    pub fn offset_value(&self) -> u32 {
        self.offset
    }

    /// Start cursor, empty when unset
    pub fn start_cursor(&self) -> &Cursor {
        &self.start_cursor
    }

    /// Render the structured-query document.
    pub fn render(&self) -> Result<JsonValue> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }

        let mut doc = Map::new();
        if !self.kind.is_empty() {
            doc.insert("kind".into(), json!([{ "name": self.kind }]));
        }

        let mut filters: Vec<JsonValue> = self.filters.iter().map(Filter::to_json).collect();
        if let Some(ancestor) = &self.ancestor {
            let has_ancestor = Filter {
                property: KEY_PROPERTY.to_string(),
                op: "HAS_ANCESTOR".to_string(),
                value: Value::Key(ancestor.clone()),
            };
            filters.push(has_ancestor.to_json());
        }
        match filters.len() {
            0 => {}
            1 => {
                doc.insert("filter".into(), filters.remove(0));
            }
            _ => {
                doc.insert(
                    "filter".into(),
                    json!({"compositeFilter": {"op": "AND", "filters": filters}}),
                );
            }
        }

        if !self.orders.is_empty() {
            let orders: Vec<JsonValue> = self.orders.iter().map(Order::to_json).collect();
            doc.insert("order".into(), JsonValue::Array(orders));
        }

        if !self.projection.is_empty() {
            doc.insert("projection".into(), property_refs(&self.projection));
        } else if self.keys_only {
            doc.insert("projection".into(), property_refs(&[KEY_PROPERTY]));
        }

        if !self.distinct_on.is_empty() {
            let names: Vec<JsonValue> = self
                .distinct_on
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            doc.insert("distinctOn".into(), JsonValue::Array(names));
        }

        if self.limit > 0 {
            doc.insert("limit".into(), json!(self.limit));
        }
        if self.offset > 0 {
            doc.insert("offset".into(), json!(self.offset));
        }
        if !self.start_cursor.is_empty() {
            doc.insert("startCursor".into(), json!(self.start_cursor.as_str()));
        }
        if !self.end_cursor.is_empty() {
            doc.insert("endCursor".into(), json!(self.end_cursor.as_str()));
        }

        trace!(
            target: "grove::query",
            kind = %self.kind,
            filters = self.filters.len(),
            ancestor = self.ancestor.is_some(),
            "Rendered query"
        );
        Ok(JsonValue::Object(doc))
    }

    /// Render a count aggregation over this query.
    ///
    /// The count is reported under [`COUNT_ALIAS`].
    pub fn count(&self) -> Result<JsonValue> {
        Ok(json!({
            "nestedQuery": self.render()?,
            "aggregations": [{ "alias": COUNT_ALIAS, "count": {} }],
        }))
    }
}

fn property_refs<S: AsRef<str>>(names: &[S]) -> JsonValue {
    JsonValue::Array(
        names
            .iter()
            .map(|name| json!({ "property": { "name": name.as_ref() } }))
            .collect(),
    )
}
