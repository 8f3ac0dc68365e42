//! Entity keys
//!
//! A [`Key`] is an ordered path of `(kind, identifier)` segments plus an
//! optional partition (project and namespace). The last segment names the
//! entity itself; the segments before it name its ancestors.
//!
//! ## Rules
//!
//! - A segment is complete when it carries a name or a numeric id, and
//!   incomplete when it carries neither.
//! - A key is incomplete iff its last segment is incomplete. Incomplete keys
//!   are placeholders for ids the store assigns on insert.
//! - Keys are immutable values; equality is structural (path + partition).
//!
//! The canonical string form (see [`Key::canonical_string`]) is stable and
//! order preserving. It is used to correlate request keys with response
//! entries, which the store may return in any order.

use crate::error::{Error, Result};
use std::fmt;

/// Identifier of one path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    /// Store-assigned or caller-chosen numeric id
    Id(i64),
    /// Caller-chosen string name
    Name(String),
}

/// One `(kind, identifier)` segment of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
    /// Entity kind, analogous to a table name
    pub kind: String,
    /// Identifier, `None` while awaiting a store-assigned id
    pub id: Option<KeyId>,
}

impl PathElement {
    /// Create a segment identified by name
    pub fn name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(KeyId::Name(name.into())),
        }
    }

    /// Create a segment identified by numeric id
    pub fn id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: Some(KeyId::Id(id)),
        }
    }

    /// Create a segment without an identifier
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// True when the segment carries a name or an id
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }
}

/// Hierarchical entity key.
///
/// The default key has an empty path; it is the zero value a record field of
/// type `Key` takes when the wire carries `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Key {
    path: Vec<PathElement>,
    namespace: Option<String>,
    project_id: Option<String>,
}

impl Key {
    /// Build a key from an explicit path.
    ///
    /// The path is not validated here; see [`Key::validate`].
    pub fn from_path(path: Vec<PathElement>) -> Self {
        Self {
            path,
            namespace: None,
            project_id: None,
        }
    }

    /// Root key identified by name
    pub fn name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_path(vec![PathElement::name(kind, name)])
    }

    /// Root key identified by numeric id
    pub fn id(kind: impl Into<String>, id: i64) -> Self {
        Self::from_path(vec![PathElement::id(kind, id)])
    }

    /// Root key awaiting a store-assigned id
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self::from_path(vec![PathElement::incomplete(kind)])
    }

    /// Child of this key identified by name
    pub fn child_name(&self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.child(PathElement::name(kind, name))
    }

    /// Child of this key identified by numeric id
    pub fn child_id(&self, kind: impl Into<String>, id: i64) -> Self {
        self.child(PathElement::id(kind, id))
    }

    /// Incomplete child of this key
    pub fn child_incomplete(&self, kind: impl Into<String>) -> Self {
        self.child(PathElement::incomplete(kind))
    }

    fn child(&self, element: PathElement) -> Self {
        let mut path = self.path.clone();
        path.push(element);
        Self {
            path,
            namespace: self.namespace.clone(),
            project_id: self.project_id.clone(),
        }
    }

    /// Copy of this key in the given namespace (empty string clears it)
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// Copy of this key in the given project (empty string clears it)
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        self.project_id = (!project_id.is_empty()).then_some(project_id);
        self
    }

    /// Copy of this key with the last segment's identifier replaced
    pub fn with_id(&self, id: KeyId) -> Self {
        let mut key = self.clone();
        if let Some(last) = key.path.last_mut() {
            last.id = Some(id);
        }
        key
    }

    /// Path segments, root first
    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Project id, if any
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Kind of the last segment
    pub fn kind(&self) -> &str {
        self.path.last().map(|e| e.kind.as_str()).unwrap_or("")
    }

    /// Identifier of the last segment
    pub fn key_id(&self) -> Option<&KeyId> {
        self.path.last().and_then(|e| e.id.as_ref())
    }

    /// Name of the last segment, if it is name-identified
    pub fn name_id(&self) -> Option<&str> {
        match self.key_id() {
            Some(KeyId::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Numeric id of the last segment, if it is id-identified
    pub fn numeric_id(&self) -> Option<i64> {
        match self.key_id() {
            Some(KeyId::Id(id)) => Some(*id),
            _ => None,
        }
    }

    /// Parent key, `None` for root keys
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            path: self.path[..self.path.len() - 1].to_vec(),
            namespace: self.namespace.clone(),
            project_id: self.project_id.clone(),
        })
    }

    /// True when the last segment has neither name nor id
    pub fn is_incomplete(&self) -> bool {
        self.path.last().map_or(true, |e| !e.is_complete())
    }

    /// True when `self` is a strict ancestor of `other` in the same partition
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        self.namespace == other.namespace
            && self.path.len() < other.path.len()
            && other.path.starts_with(&self.path)
    }

    /// Check the structural rules every stored key must satisfy.
    ///
    /// - the path is non-empty
    /// - every kind is non-empty
    /// - every ancestor segment is complete
    /// - names are non-empty
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(Error::invalid_key("key path is empty"));
        }
        let last = self.path.len() - 1;
        for (i, element) in self.path.iter().enumerate() {
            if element.kind.is_empty() {
                return Err(Error::invalid_key(format!("segment {i} has an empty kind")));
            }
            match &element.id {
                None if i < last => {
                    return Err(Error::invalid_key(format!(
                        "ancestor segment {i} ({}) is incomplete",
                        element.kind
                    )));
                }
                Some(KeyId::Name(name)) if name.is_empty() => {
                    return Err(Error::invalid_key(format!("segment {i} has an empty name")));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate and additionally require a complete key
    pub fn validate_complete(&self) -> Result<()> {
        self.validate()?;
        if self.is_incomplete() {
            return Err(Error::invalid_key(format!("{self} is incomplete")));
        }
        Ok(())
    }

    /// Stable textual form used for correlation.
    ///
    /// Format: optional `@namespace` prefix followed by one `/"Kind",ident`
    /// chunk per segment. Kinds and names are quoted and escaped so they can
    /// never be confused with ids or with segment separators; incomplete
    /// segments render their identifier as `?`.
    pub fn canonical_string(&self) -> String {
        let mut out = String::new();
        if let Some(ns) = &self.namespace {
            out.push('@');
            out.push_str(&format!("{ns:?}"));
        }
        for element in &self.path {
            out.push('/');
            out.push_str(&format!("{:?}", element.kind));
            out.push(',');
            match &element.id {
                Some(KeyId::Id(id)) => out.push_str(&id.to_string()),
                Some(KeyId::Name(name)) => out.push_str(&format!("{name:?}")),
                None => out.push('?'),
            }
        }
        out
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}
