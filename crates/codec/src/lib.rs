//! Codecs between Rust values and typed property values
//!
//! Two layers:
//! - [`Encode`] / [`Decode`]: the value codec, one impl per supported kind
//! - [`Record`] / [`Schema`]: the record codec, driven by a per-type schema
//!   descriptor built once and shared by encode and decode
//!
//! Records convert to and from [`Entity`] documents through [`Document`],
//! which [`Entity`] itself also implements for untyped access.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Task { name: String, done: bool }
//!
//! impl Record for Task {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: Lazy<Schema<Task>> = Lazy::new(|| {
//!             Schema::<Task>::builder("Task")
//!                 .field("Name", |t| &t.name, |t| &mut t.name)
//!                 .field("Done", |t| &t.done, |t| &mut t.done).omit_empty()
//!                 .build()
//!         });
//!         &SCHEMA
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod schema;
pub mod value;

pub use record::{decode_embedded, decode_entity, encode_embedded, encode_entity, Document, Record};
pub use schema::{FieldOptions, FieldTag, Schema, SchemaBuilder};
pub use value::{decode_value, encode_value, Decode, Encode};

/// Lazy cell for the `static` holding a record's schema.
pub use once_cell::sync::Lazy;

// Re-exported for `entity_value!` expansions.
#[doc(hidden)]
pub use grove_core::{Entity, Result, Value};
