//! Paginated query results
//!
//! [`ResultIterator`] walks a query's results across as many batches as the
//! store hands out.
//!
//! ## States
//!
//! ```text
//!            fetch ok, non-empty             batch drained, more
//! NeedFetch ─────────────────────▶ Buffered ─────────────────────▶ NeedFetch
//!     │                               │
//!     │ fetch ok, empty               │ batch drained, no more
//!     ▼                               ▼
//! Exhausted ◀─────────────────────────┘
//!
//! any fetch error ─▶ Failed (sticky)
//! ```
//!
//! Only `NOT_FINISHED` and `MORE_RESULTS_AFTER_CURSOR` lead to another
//! fetch. Once exhausted, every call returns `Ok(None)`; once failed, every
//! call returns the same error.
//!
//! A malformed or undecodable result is returned as an error for that
//! result only; the iterator moves on to the next one.
//!
//! The iterator is driven through `&mut self`. Sharing one across threads
//! needs external synchronization.

use crate::client::Client;
use crate::response::EntityResult;
use crate::transport::Context;
use grove_codec::Document;
use grove_core::{Cursor, Error, Key, Result};
use grove_query::Query;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// One query result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryItem<T> {
    /// Entity key
    pub key: Key,
    /// Decoded entity; `None` for keys-only queries
    pub value: Option<T>,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Buffered,
    NeedFetch,
    Exhausted,
    Failed(Error),
}

/// Iterator over a query's results
pub struct ResultIterator<'c, T> {
    client: &'c Client,
    ctx: Context,
    query: Query,
    state: State,
    batch: Vec<EntityResult>,
    index: usize,
    // Position reported by `cursor()`
    cursor: Option<Cursor>,
    // Where the next fetch starts
    end_cursor: Option<Cursor>,
    more: bool,
    // Set once `Iterator::next` has reported the end or a terminal error
    fused: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<'c, T: Document> ResultIterator<'c, T> {
    pub(crate) fn new(client: &'c Client, ctx: Context, query: Query) -> Self {
        Self {
            client,
            ctx,
            query,
            state: State::NeedFetch,
            batch: Vec::new(),
            index: 0,
            cursor: None,
            end_cursor: None,
            more: false,
            fused: false,
            _marker: PhantomData,
        }
    }

    /// Next result, `Ok(None)` when the query is exhausted.
    pub fn advance(&mut self) -> Result<Option<QueryItem<T>>> {
        loop {
            match &self.state {
                State::Failed(e) => return Err(e.clone()),
                State::Exhausted => return Ok(None),
                State::Buffered => {
                    if self.index < self.batch.len() {
                        let index = self.index;
                        self.index += 1;
                        return self.take(index).map(Some);
                    }
                    if let Some(end) = self.end_cursor.clone() {
                        self.cursor = Some(end);
                    }
                    self.state = if self.more {
                        State::NeedFetch
                    } else {
                        State::Exhausted
                    };
                }
                State::NeedFetch => self.fetch(),
            }
        }
    }

    fn take(&mut self, index: usize) -> Result<QueryItem<T>> {
        let result = &self.batch[index];
        if let Some(cursor) = &result.cursor {
            trace!(target: "grove::client", cursor = %cursor, "Adopted result cursor");
            self.cursor = Some(cursor.clone());
        }
        let key = result.key()?;
        let value = if self.query.is_keys_only() {
            None
        } else {
            Some(T::from_entity(&result.to_entity()?)?)
        };
        Ok(QueryItem { key, value })
    }

    fn fetch(&mut self) {
        let mut query = self.query.clone();
        if let Some(cursor) = &self.end_cursor {
            query = query.start(cursor.clone());
        }

        let batch = match self.client.run_query(&self.ctx, &query) {
            Ok(batch) => batch,
            Err(e) => {
                debug!(target: "grove::client", error = %e, "Query fetch failed");
                self.state = State::Failed(e);
                return;
            }
        };
        debug!(
            target: "grove::client",
            results = batch.entity_results.len(),
            more = ?batch.more_results,
            skipped = batch.skipped_results,
            "Fetched query batch"
        );

        // The store applied part of the offset; do not apply it again.
        if batch.skipped_results > 0 {
            let offset = self.query.offset_value().saturating_sub(batch.skipped_results);
            self.query = self.query.clone().offset(offset);
        }
        if let Some(end) = batch.end_cursor {
            trace!(target: "grove::client", cursor = %end, "Adopted end cursor");
            self.end_cursor = Some(end);
        }
        self.more = batch.more_results.has_more();

        if batch.entity_results.is_empty() {
            // An empty batch that only skipped results is still mid-offset.
            self.state = if self.more && batch.skipped_results > 0 {
                State::NeedFetch
            } else {
                State::Exhausted
            };
            return;
        }

        self.batch = batch.entity_results;
        self.index = 0;
        self.state = State::Buffered;
    }

    /// Cursor just after the most recently returned result.
    ///
    /// # Errors
    ///
    /// [`Error::CursorUnavailable`] before any cursor has been observed.
    pub fn cursor(&self) -> Result<Cursor> {
        self.cursor.clone().ok_or(Error::CursorUnavailable)
    }

    /// The query being iterated, with offset adjusted for skipped results
    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl<T: Document> Iterator for ResultIterator<'_, T> {
    type Item = Result<QueryItem<T>>;

    /// Yields each result, a terminal error once, then `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(e) => {
                if matches!(self.state, State::Failed(_)) {
                    self.fused = true;
                }
                Some(Err(e))
            }
        }
    }
}
