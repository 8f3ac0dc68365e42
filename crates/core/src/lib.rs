//! Core types for Grove
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Typed property value union of the store protocol
//! - Key: Hierarchical entity key with partition and canonical string form
//! - Entity / Property: Keyed property documents with index flags
//! - Cursor: Opaque query continuation token
//! - Error: Error type hierarchy shared by every crate
//! - Limits: Nesting depth guard used by the codecs
//! - Wire: JSON mapping for values, keys and entities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod entity;
pub mod error;
pub mod key;
pub mod limits;
pub mod value;
pub mod wire;

pub use cursor::Cursor;
pub use entity::{Entity, Property};
pub use error::{Error, MultiError, Result, TransportError};
pub use key::{Key, KeyId, PathElement};
pub use limits::{check_depth, MAX_NESTING_DEPTH};
pub use value::Value;
