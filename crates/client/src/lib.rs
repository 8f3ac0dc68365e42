//! Blocking client for Grove
//!
//! The client turns typed calls into wire requests and hands them to a
//! caller-supplied [`Transport`]:
//! - lookups (`get`, `get_multi`) with out-of-order correlation and
//!   deferred-key retries
//! - commits (`put`, `insert`, `update`, `upsert`, `delete` and batches)
//! - id allocation
//! - queries through [`ResultIterator`] and count aggregation
//!
//! Configuration is read from `grove.toml` (see [`ClientConfig`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod iterator;
pub mod mutation;
pub mod response;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, CONFIG_FILE_NAME};
pub use iterator::{QueryItem, ResultIterator};
pub use mutation::Mutation;
pub use response::MoreResults;
pub use transport::{Context, StaticToken, TokenSource, Transport};
