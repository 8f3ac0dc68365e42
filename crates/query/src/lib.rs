//! Structured queries for Grove
//!
//! [`Query`] accumulates kind, filters, orderings, projection, distinct-on,
//! ancestor, paging and cursor state, and renders the structured-query
//! document the store executes. Rendering is purely syntactic: nothing here
//! plans or validates a query against indexes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod filter;
pub mod order;
pub mod query;

pub use filter::{canonical_operator, Filter, KEY_PROPERTY};
pub use order::{Direction, Order};
pub use query::{Query, COUNT_ALIAS};
