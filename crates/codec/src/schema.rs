//! Record schema descriptors
//!
//! A [`Schema`] lists a record type's fields in declaration order, each with
//! its property name, tag options and a pair of accessors. It is built once
//! per type (usually inside a `once_cell::sync::Lazy`) and read by both the
//! encoder and the decoder, so the two directions always agree on naming.
//!
//! Field placements:
//! - value fields become one property each
//! - embedded records are promoted into the parent without a prefix
//! - flattened records are merged under `<field>.`
//! - skipped fields never touch the wire
//!
//! Tag strings follow the `name,option,...` convention (see [`FieldTag`]).

use crate::record::{decode_fields, encode_fields, Properties, Record};
use crate::value::{Decode, Encode};
use grove_core::{Error, Property, Result};
use std::marker::PhantomData;

/// Per-field options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Skip the field when its value is empty
    pub omit_empty: bool,
    /// Exclude the emitted properties from indexes
    pub no_index: bool,
    /// Merge a nested record under `<field>.`
    pub flatten: bool,
}

/// Parsed tag string.
///
/// `"-"` skips the field. Otherwise the tag is a comma-separated list whose
/// first element is the property name (empty keeps the declared name) and
/// whose remaining elements are `omitempty`, `noindex` or `flatten`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    /// Explicit property name
    pub name: Option<String>,
    /// Field is never encoded or decoded
    pub skip: bool,
    /// Tag options
    pub options: FieldOptions,
}

impl FieldTag {
    /// Parse a tag string.
    pub fn parse(tag: &str) -> Result<FieldTag> {
        if tag.trim() == "-" {
            return Ok(FieldTag {
                skip: true,
                ..FieldTag::default()
            });
        }
        let mut parts = tag.split(',');
        let name = parts
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let mut options = FieldOptions::default();
        for option in parts {
            match option.trim() {
                "omitempty" => options.omit_empty = true,
                "noindex" => options.no_index = true,
                "flatten" => options.flatten = true,
                "" => {}
                other => {
                    return Err(Error::invalid_input(format!(
                        "unknown field option {other:?} in tag {tag:?}"
                    )))
                }
            }
        }
        Ok(FieldTag {
            name,
            skip: false,
            options,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Value,
    Embedded,
    Flatten,
}

/// Where a field lands while encoding or decoding one record.
pub(crate) struct Slot<'a> {
    name: &'a str,
    prefix: &'a str,
    placement: Placement,
    options: FieldOptions,
    inherited_no_index: bool,
    depth: usize,
}

impl Slot<'_> {
    fn property_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    fn nested_prefix(&self) -> String {
        match self.placement {
            Placement::Flatten => format!("{}{}.", self.prefix, self.name),
            _ => self.prefix.to_string(),
        }
    }

    fn no_index(&self) -> bool {
        self.inherited_no_index || self.options.no_index
    }
}

trait FieldAccess<T>: Send + Sync {
    fn encode(&self, record: &T, slot: &Slot<'_>, out: &mut Properties) -> Result<()>;
    fn decode(&self, record: &mut T, slot: &Slot<'_>, props: &Properties) -> Result<()>;
}

struct ValueField<G, S, F> {
    get: G,
    get_mut: S,
    _marker: PhantomData<fn() -> F>,
}

impl<T, F, G, S> FieldAccess<T> for ValueField<G, S, F>
where
    F: Encode + Decode,
    G: Fn(&T) -> &F + Send + Sync,
    S: Fn(&mut T) -> &mut F + Send + Sync,
{
    fn encode(&self, record: &T, slot: &Slot<'_>, out: &mut Properties) -> Result<()> {
        let value = (self.get)(record);
        if slot.options.omit_empty && value.is_empty_value() {
            return Ok(());
        }
        let property = Property {
            value: value.encode(slot.depth + 1)?,
            exclude_from_indexes: slot.no_index(),
        };
        out.insert(slot.property_name(), property);
        Ok(())
    }

    fn decode(&self, record: &mut T, slot: &Slot<'_>, props: &Properties) -> Result<()> {
        if let Some(property) = props.get(&slot.property_name()) {
            *(self.get_mut)(record) = F::decode(&property.value, slot.depth + 1)?;
        }
        Ok(())
    }
}

struct NestedField<G, S, F> {
    get: G,
    get_mut: S,
    _marker: PhantomData<fn() -> F>,
}

impl<T, F, G, S> FieldAccess<T> for NestedField<G, S, F>
where
    F: Record,
    G: Fn(&T) -> &F + Send + Sync,
    S: Fn(&mut T) -> &mut F + Send + Sync,
{
    fn encode(&self, record: &T, slot: &Slot<'_>, out: &mut Properties) -> Result<()> {
        encode_fields(
            (self.get)(record),
            &slot.nested_prefix(),
            slot.no_index(),
            slot.depth + 1,
            out,
        )
    }

    fn decode(&self, record: &mut T, slot: &Slot<'_>, props: &Properties) -> Result<()> {
        decode_fields((self.get_mut)(record), props, &slot.nested_prefix(), slot.depth + 1)
    }
}

struct OptionalNestedField<G, S, F> {
    get: G,
    get_mut: S,
    _marker: PhantomData<fn() -> F>,
}

impl<T, F, G, S> FieldAccess<T> for OptionalNestedField<G, S, F>
where
    F: Record,
    G: Fn(&T) -> &Option<F> + Send + Sync,
    S: Fn(&mut T) -> &mut Option<F> + Send + Sync,
{
    fn encode(&self, record: &T, slot: &Slot<'_>, out: &mut Properties) -> Result<()> {
        match (self.get)(record) {
            Some(inner) => encode_fields(
                inner,
                &slot.nested_prefix(),
                slot.no_index(),
                slot.depth + 1,
                out,
            ),
            None => Ok(()),
        }
    }

    fn decode(&self, record: &mut T, slot: &Slot<'_>, props: &Properties) -> Result<()> {
        let prefix = slot.nested_prefix();
        if !props.keys().any(|name| name.starts_with(&prefix)) {
            return Ok(());
        }
        let mut inner = F::default();
        decode_fields(&mut inner, props, &prefix, slot.depth + 1)?;
        *(self.get_mut)(record) = Some(inner);
        Ok(())
    }
}

/// One field of a record schema.
pub(crate) struct Field<T> {
    name: String,
    placement: Placement,
    options: FieldOptions,
    // None for skipped fields
    access: Option<Box<dyn FieldAccess<T>>>,
}

impl<T> Field<T> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn slot<'a>(&'a self, prefix: &'a str, inherited_no_index: bool, depth: usize) -> Slot<'a> {
        Slot {
            name: &self.name,
            prefix,
            placement: self.placement,
            options: self.options,
            inherited_no_index,
            depth,
        }
    }

    pub(crate) fn encode(
        &self,
        record: &T,
        prefix: &str,
        inherited_no_index: bool,
        depth: usize,
        out: &mut Properties,
    ) -> Result<()> {
        match &self.access {
            Some(access) => access.encode(record, &self.slot(prefix, inherited_no_index, depth), out),
            None => Ok(()),
        }
    }

    pub(crate) fn decode(
        &self,
        record: &mut T,
        props: &Properties,
        prefix: &str,
        depth: usize,
    ) -> Result<()> {
        match &self.access {
            Some(access) => access.decode(record, &self.slot(prefix, false, depth), props),
            None => Ok(()),
        }
    }
}

/// Schema descriptor of a record type.
pub struct Schema<T> {
    name: &'static str,
    fields: Vec<Field<T>>,
    error: Option<Error>,
}

impl<T: 'static> Schema<T> {
    /// Start a schema for the record type called `name`.
    pub fn builder(name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            schema: Schema {
                name,
                fields: Vec::new(),
                error: None,
            },
        }
    }
}

impl<T> Schema<T> {
    /// Record type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Names of the fields that reach the wire, in declaration order.
    ///
    /// Embedded and flattened records contribute their own field names
    /// only when encoded; here they appear under their field name.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.access.is_some())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Fail with the first problem recorded while the schema was built.
    pub fn check(&self) -> Result<()> {
        match &self.error {
            Some(e) => Err(Error::invalid_input(format!("schema {}: {e}", self.name))),
            None => Ok(()),
        }
    }

    pub(crate) fn fields(&self) -> &[Field<T>] {
        &self.fields
    }
}

/// Builder for [`Schema`].
///
/// Option methods (`omit_empty`, `no_index`, `rename`, `tag`) apply to the
/// most recently declared field. Misuse is recorded and reported by
/// [`Schema::check`] when the schema is first used.
pub struct SchemaBuilder<T> {
    schema: Schema<T>,
}

impl<T: 'static> SchemaBuilder<T> {
    fn push(mut self, name: String, placement: Placement, access: Option<Box<dyn FieldAccess<T>>>) -> Self {
        let options = FieldOptions {
            flatten: placement == Placement::Flatten,
            ..FieldOptions::default()
        };
        self.schema.fields.push(Field {
            name,
            placement,
            options,
            access,
        });
        self
    }

    fn record_error(&mut self, error: Error) {
        if self.schema.error.is_none() {
            self.schema.error = Some(error);
        }
    }

    fn with_last(mut self, op: &str, apply: impl FnOnce(&mut Field<T>) -> Result<()>) -> Self {
        let result = match self.schema.fields.last_mut() {
            Some(field) => apply(field),
            None => Err(Error::invalid_input(format!("{op} called before any field"))),
        };
        if let Err(e) = result {
            self.record_error(e);
        }
        self
    }

    /// Declare a value field stored as one property.
    pub fn field<F, G, S>(self, name: &str, get: G, get_mut: S) -> Self
    where
        F: Encode + Decode + 'static,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let access = ValueField {
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(name.to_string(), Placement::Value, Some(Box::new(access)))
    }

    /// Declare an embedded record whose fields are promoted into this one.
    pub fn embed<F, G, S>(self, get: G, get_mut: S) -> Self
    where
        F: Record,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let name = short_type_name::<F>().to_string();
        let access = NestedField {
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(name, Placement::Embedded, Some(Box::new(access)))
    }

    /// Declare a record field merged under `<name>.`.
    pub fn flatten<F, G, S>(self, name: &str, get: G, get_mut: S) -> Self
    where
        F: Record,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let access = NestedField {
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(name.to_string(), Placement::Flatten, Some(Box::new(access)))
    }

    /// Declare an optional record field merged under `<name>.`; `None` is skipped.
    pub fn flatten_optional<F, G, S>(self, name: &str, get: G, get_mut: S) -> Self
    where
        F: Record,
        G: Fn(&T) -> &Option<F> + Send + Sync + 'static,
        S: Fn(&mut T) -> &mut Option<F> + Send + Sync + 'static,
    {
        let access = OptionalNestedField {
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(name.to_string(), Placement::Flatten, Some(Box::new(access)))
    }

    /// Declare a field that never reaches the wire.
    pub fn skip(self, name: &str) -> Self {
        self.push(name.to_string(), Placement::Value, None)
    }

    /// Omit the last field when its value is empty.
    pub fn omit_empty(self) -> Self {
        self.with_last("omit_empty", |field| {
            field.options.omit_empty = true;
            Ok(())
        })
    }

    /// Exclude the last field's properties from indexes.
    pub fn no_index(self) -> Self {
        self.with_last("no_index", |field| {
            field.options.no_index = true;
            Ok(())
        })
    }

    /// Change the last field's property name.
    pub fn rename(self, name: &str) -> Self {
        self.with_last("rename", |field| {
            if name.is_empty() {
                return Err(Error::invalid_input(format!("empty name for field {}", field.name)));
            }
            field.name = name.to_string();
            Ok(())
        })
    }

    /// Apply a tag string to the last field.
    ///
    /// `flatten` in a tag must agree with how the field was declared: it is
    /// accepted on fields declared with [`flatten`](Self::flatten) and is an
    /// error on value fields.
    pub fn tag(self, tag: &str) -> Self {
        let parsed = FieldTag::parse(tag);
        self.with_last("tag", move |field| {
            let tag = parsed?;
            if tag.skip {
                field.access = None;
                return Ok(());
            }
            if tag.options.flatten && field.placement != Placement::Flatten {
                return Err(Error::invalid_input(format!(
                    "field {} is not a record and cannot be flattened",
                    field.name
                )));
            }
            if let Some(name) = tag.name {
                field.name = name;
            }
            field.options.omit_empty |= tag.options.omit_empty;
            field.options.no_index |= tag.options.no_index;
            Ok(())
        })
    }

    /// Finish the schema.
    pub fn build(self) -> Schema<T> {
        self.schema
    }
}

fn short_type_name<F>() -> &'static str {
    let full = std::any::type_name::<F>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
