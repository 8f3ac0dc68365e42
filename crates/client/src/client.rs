//! Client orchestration
//!
//! [`Client`] owns the configuration and the transport collaborators and
//! turns each typed call into one or a few sequential requests.
//!
//! ## Batch semantics
//!
//! - `get_multi` returns one result per requested key, in request order,
//!   whatever order the store answers in. A missing entity or a decode
//!   failure affects only its own slot.
//! - `put_multi` and `delete_multi` validate every item first and report
//!   all invalid items at once as [`Error::Multi`]; the commit itself
//!   succeeds or fails as a whole.

use crate::config::ClientConfig;
use crate::iterator::ResultIterator;
use crate::mutation::Mutation;
use crate::response::{
    AggregationResponse, AllocateIdsResponse, CommitResponse, LookupResponse, QueryResultBatch,
    RunQueryResponse,
};
use crate::transport::{Context, TokenSource, Transport};
use grove_codec::Document;
use grove_core::wire::{key_to_json, partition_to_json};
use grove_core::{Error, Key, MultiError, Result, TransportError, Value};
use grove_query::{Query, COUNT_ALIAS};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Blocking client for one project and database
pub struct Client {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    tokens: Box<dyn TokenSource>,
}

impl Client {
    /// Create a client after validating `config`.
    pub fn new(
        config: ClientConfig,
        transport: impl Transport + 'static,
        tokens: impl TokenSource + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport: Box::new(transport),
            tokens: Box::new(tokens),
        })
    }

    /// The client's configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Apply the default namespace to a key that has none.
    fn qualify(&self, key: &Key) -> Key {
        match (&self.config.namespace, key.namespace()) {
            (Some(ns), None) => key.clone().with_namespace(ns.clone()),
            _ => key.clone(),
        }
    }

    fn qualify_mutation(&self, mutation: Mutation) -> Mutation {
        match mutation {
            Mutation::Insert(mut e) => {
                e.key = e.key.map(|k| self.qualify(&k));
                Mutation::Insert(e)
            }
            Mutation::Update(mut e) => {
                e.key = e.key.map(|k| self.qualify(&k));
                Mutation::Update(e)
            }
            Mutation::Upsert(mut e) => {
                e.key = e.key.map(|k| self.qualify(&k));
                Mutation::Upsert(e)
            }
            Mutation::Delete(k) => Mutation::Delete(self.qualify(&k)),
        }
    }

    fn partition(&self, namespace: Option<&str>) -> Option<JsonValue> {
        let namespace = namespace.or(self.config.namespace.as_deref());
        partition_to_json(Some(&self.config.project_id), namespace)
    }

    /// Send one request and parse the response body.
    fn call<R: DeserializeOwned>(&self, ctx: &Context, method: &str, mut body: JsonValue) -> Result<R> {
        ctx.check()?;
        if let (Some(db), Some(obj)) = (&self.config.database_id, body.as_object_mut()) {
            obj.insert("databaseId".to_string(), json!(db));
        }
        let url = self.config.url(method);
        let payload = serde_json::to_vec(&body)?;
        let token = self.tokens.token(ctx)?;

        debug!(target: "grove::client", method, url = %url, bytes = payload.len(), "Sending request");
        let response = self.transport.perform(ctx, &url, &payload, &token)?;

        if response.is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&response)?)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Fetch the entity stored under `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NoSuchEntity`] when there is none, decode errors from `T`,
    /// and transport errors unchanged.
    pub fn get<T: Document>(&self, ctx: &Context, key: &Key) -> Result<T> {
        key.validate_complete()?;
        let mut results = self.lookup::<T>(ctx, std::slice::from_ref(key))?;
        results
            .pop()
            .unwrap_or_else(|| Err(Error::wire("lookup returned no result")))
    }

    /// Fetch several entities; slot `i` is the outcome for `keys[i]`.
    ///
    /// # Errors
    ///
    /// [`Error::Multi`] when any key is invalid or incomplete (nothing is
    /// sent), or a transport error for the lookup itself.
    pub fn get_multi<T: Document>(&self, ctx: &Context, keys: &[Key]) -> Result<Vec<Result<T>>> {
        let mut errors = MultiError::with_len(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if let Err(e) = key.validate_complete() {
                errors.0[i] = Some(e);
            }
        }
        errors.into_result()?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.lookup(ctx, keys)
    }

    fn lookup<T: Document>(&self, ctx: &Context, keys: &[Key]) -> Result<Vec<Result<T>>> {
        let qualified: Vec<Key> = keys.iter().map(|k| self.qualify(k)).collect();

        // Responses arrive in any order; correlate by canonical string.
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut pending = Vec::new();
        for (i, key) in qualified.iter().enumerate() {
            let slots = positions.entry(key.canonical_string()).or_default();
            if slots.is_empty() {
                pending.push(key.clone());
            }
            slots.push(i);
        }

        let mut results: Vec<Option<Result<T>>> = keys.iter().map(|_| None).collect();
        let mut round = 0;
        while !pending.is_empty() && round < self.config.lookup_rounds {
            round += 1;
            let body = json!({ "keys": pending.iter().map(key_to_json).collect::<Vec<_>>() });
            let response: LookupResponse = self.call(ctx, "lookup", body)?;
            debug!(
                target: "grove::client",
                round,
                found = response.found.len(),
                missing = response.missing.len(),
                deferred = response.deferred.len(),
                "Lookup round"
            );

            for found in &response.found {
                let Some(indexes) = found
                    .key()
                    .ok()
                    .and_then(|k| positions.get(&k.canonical_string()))
                else {
                    debug!(target: "grove::client", "Ignoring lookup result for a key that was not requested");
                    continue;
                };
                // A malformed entity fails only its own slots.
                for &i in indexes {
                    results[i] = Some(found.to_entity().and_then(|entity| T::from_entity(&entity)));
                }
            }
            for missing in &response.missing {
                let Some(indexes) = missing
                    .key()
                    .ok()
                    .and_then(|k| positions.get(&k.canonical_string()))
                else {
                    continue;
                };
                for &i in indexes {
                    results[i] = Some(Err(Error::NoSuchEntity {
                        key: keys[i].clone(),
                    }));
                }
            }
            pending = response.deferred;
        }

        if !pending.is_empty() {
            warn!(
                target: "grove::client",
                unresolved = pending.len(),
                rounds = round,
                "Lookup left deferred keys unresolved"
            );
        }

        Ok(results
            .into_iter()
            .zip(keys)
            .map(|(result, key)| {
                result.unwrap_or_else(|| {
                    Err(Error::Transport(TransportError::new(format!(
                        "no lookup result for {key} after {round} round(s)"
                    ))))
                })
            })
            .collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Commit `mutations` as one non-transactional request.
    ///
    /// Returns one key per mutation, with store-assigned ids filled in for
    /// incomplete keys.
    pub fn mutate(&self, ctx: &Context, mutations: Vec<Mutation>) -> Result<Vec<Key>> {
        if mutations.is_empty() {
            return Ok(Vec::new());
        }
        let mutations: Vec<Mutation> = mutations
            .into_iter()
            .map(|m| self.qualify_mutation(m))
            .collect();
        let body = json!({
            "mode": "NON_TRANSACTIONAL",
            "mutations": mutations.iter().map(Mutation::to_json).collect::<Vec<_>>(),
        });
        let response: CommitResponse = self.call(ctx, "commit", body)?;
        debug!(
            target: "grove::client",
            mutations = mutations.len(),
            results = response.mutation_results.len(),
            "Committed"
        );

        Ok(mutations
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let requested = m.key().cloned().unwrap_or_default();
                let assigned = response.mutation_results.get(i).and_then(|r| r.key.clone());
                match assigned {
                    Some(key) if requested.is_incomplete() => key,
                    _ => requested,
                }
            })
            .collect())
    }

    fn mutate_one(&self, ctx: &Context, mutation: Mutation) -> Result<Key> {
        self.mutate(ctx, vec![mutation])?
            .pop()
            .ok_or_else(|| Error::wire("commit returned no key"))
    }

    /// Insert or replace `value` under `key`; returns the stored key.
    pub fn put<T: Document>(&self, ctx: &Context, key: &Key, value: &T) -> Result<Key> {
        self.upsert(ctx, key, value)
    }

    /// Create `value` under `key`; returns the stored key.
    pub fn insert<T: Document>(&self, ctx: &Context, key: &Key, value: &T) -> Result<Key> {
        self.mutate_one(ctx, Mutation::insert(key.clone(), value)?)
    }

    /// Replace the entity under the complete `key`.
    pub fn update<T: Document>(&self, ctx: &Context, key: &Key, value: &T) -> Result<Key> {
        self.mutate_one(ctx, Mutation::update(key.clone(), value)?)
    }

    /// Insert or replace `value` under `key`; returns the stored key.
    pub fn upsert<T: Document>(&self, ctx: &Context, key: &Key, value: &T) -> Result<Key> {
        self.mutate_one(ctx, Mutation::upsert(key.clone(), value)?)
    }

    /// Delete the entity under the complete `key`.
    pub fn delete(&self, ctx: &Context, key: &Key) -> Result<()> {
        self.mutate_one(ctx, Mutation::delete(key.clone())?)?;
        Ok(())
    }

    /// Upsert `values[i]` under `keys[i]` in one commit.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when the slices differ in length,
    /// [`Error::Multi`] when any key is invalid or any value fails to encode.
    pub fn put_multi<T: Document>(&self, ctx: &Context, keys: &[Key], values: &[T]) -> Result<Vec<Key>> {
        if keys.len() != values.len() {
            return Err(Error::invalid_input(format!(
                "put_multi got {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        let mutations = collect_positional(
            keys.iter()
                .zip(values)
                .map(|(key, value)| Mutation::upsert(key.clone(), value)),
        )?;
        self.mutate(ctx, mutations)
    }

    /// Delete every key in one commit.
    pub fn delete_multi(&self, ctx: &Context, keys: &[Key]) -> Result<()> {
        let mutations = collect_positional(keys.iter().map(|key| Mutation::delete(key.clone())))?;
        self.mutate(ctx, mutations)?;
        Ok(())
    }

    /// Complete incomplete keys with store-assigned ids without writing.
    pub fn allocate_ids(&self, ctx: &Context, keys: &[Key]) -> Result<Vec<Key>> {
        let qualified = collect_positional(keys.iter().map(|key| {
            key.validate()?;
            if !key.is_incomplete() {
                return Err(Error::invalid_key(format!("{key} is already complete")));
            }
            Ok(self.qualify(key))
        }))?;
        if qualified.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({ "keys": qualified.iter().map(key_to_json).collect::<Vec<_>>() });
        let response: AllocateIdsResponse = self.call(ctx, "allocateIds", body)?;
        if response.keys.len() != qualified.len() {
            return Err(Error::wire(format!(
                "allocateIds returned {} keys for {} requested",
                response.keys.len(),
                qualified.len()
            )));
        }
        Ok(response.keys)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run `query`, returning an iterator over its results.
    ///
    /// Nothing is sent until the iterator is first advanced.
    pub fn run<T: Document>(&self, ctx: &Context, query: Query) -> ResultIterator<'_, T> {
        ResultIterator::new(self, ctx.clone(), query)
    }

    /// Fetch one batch of `query`.
    pub(crate) fn run_query(&self, ctx: &Context, query: &Query) -> Result<QueryResultBatch> {
        let mut body = json!({ "query": query.render()? });
        if let Some(partition) = self.partition(query.partition_namespace()) {
            body["partitionId"] = partition;
        }
        let response: RunQueryResponse = self.call(ctx, "runQuery", body)?;
        Ok(response.batch)
    }

    /// Count the entities matching `query`.
    pub fn count(&self, ctx: &Context, query: &Query) -> Result<i64> {
        let mut body = json!({ "aggregationQuery": query.count()? });
        if let Some(partition) = self.partition(query.partition_namespace()) {
            body["partitionId"] = partition;
        }
        let response: AggregationResponse = self.call(ctx, "runAggregationQuery", body)?;
        let value = response
            .batch
            .aggregation_results
            .first()
            .and_then(|row| row.aggregate_properties.get(COUNT_ALIAS));
        match value {
            Some(Value::Integer(n)) => Ok(*n),
            Some(other) => Err(Error::type_mismatch("count", other.type_name())),
            None => Err(Error::wire(format!(
                "aggregation response has no '{COUNT_ALIAS}' result"
            ))),
        }
    }
}

/// Collect per-item results, reporting every failure positionally.
fn collect_positional<T>(items: impl Iterator<Item = Result<T>>) -> Result<Vec<T>> {
    let mut values = Vec::new();
    let mut errors = Vec::new();
    let mut failed = false;
    for item in items {
        match item {
            Ok(value) => {
                values.push(value);
                errors.push(None);
            }
            Err(e) => {
                failed = true;
                errors.push(Some(e));
            }
        }
    }
    if failed {
        return Err(Error::Multi(MultiError(errors)));
    }
    Ok(values)
}
