//! Grove - typed entity codec and query layer for JSON entity stores
//!
//! Grove maps Rust records onto the typed property documents of a remote
//! key-value entity store and back, builds structured queries, and walks
//! paginated query results through a caller-supplied transport.
//!
//! # Quick Start
//!
//! ```ignore
//! use grove::{Client, ClientConfig, Context, Key, Lazy, Query, Record, Schema, StaticToken};
//!
//! #[derive(Debug, Default)]
//! struct Task {
//!     title: String,
//!     done: bool,
//! }
//!
//! impl Record for Task {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: Lazy<Schema<Task>> = Lazy::new(|| {
//!             Schema::<Task>::builder("Task")
//!                 .field("Title", |t| &t.title, |t| &mut t.title)
//!                 .field("Done", |t| &t.done, |t| &mut t.done)
//!                 .omit_empty()
//!                 .build()
//!         });
//!         &SCHEMA
//!     }
//! }
//!
//! let config = ClientConfig::from_file(Path::new("grove.toml"))?;
//! let client = Client::new(config, my_transport, StaticToken(token))?;
//! let ctx = Context::new();
//!
//! let key = client.put(&ctx, &Key::incomplete("Task"), &Task { title: "write docs".into(), done: false })?;
//! let task: Task = client.get(&ctx, &key)?;
//!
//! for item in client.run::<Task>(&ctx, Query::new("Task").filter("Done", "=", false)) {
//!     let item = item?;
//!     println!("{} {:?}", item.key, item.value);
//! }
//! ```
//!
//! # Architecture
//!
//! | Crate | Role |
//! |-------|------|
//! | `grove-core` | values, keys, entities, cursors, errors, wire mapping |
//! | `grove-codec` | value codec and schema-driven record codec |
//! | `grove-query` | query builder and renderer |
//! | `grove-client` | configuration, transport traits, client, result iterator |

pub use grove_client::{
    Client, ClientConfig, Context, Mutation, MoreResults, QueryItem, ResultIterator, StaticToken,
    TokenSource, Transport, CONFIG_FILE_NAME,
};
pub use grove_codec::{
    decode_entity, decode_value, encode_entity, encode_value, entity_value, Decode, Document,
    Encode, FieldOptions, FieldTag, Lazy, Record, Schema, SchemaBuilder,
};
pub use grove_core::{
    wire, Cursor, Entity, Error, Key, KeyId, MultiError, PathElement, Property, Result,
    TransportError, Value, MAX_NESTING_DEPTH,
};
pub use grove_query::{Direction, Order, Query, COUNT_ALIAS};
