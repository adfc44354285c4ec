//! Tags: the addresses the decoder uses to locate values in a tree.
//!
//! Object fields are addressed by a [`KeyPath`] that grows by one segment per
//! nesting level (`inner.obj.string`). Sequence elements are addressed by
//! their position alone; a structure found inside a list element starts a
//! fresh path scope.

use std::fmt;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, Result};

/// A dotted path of object keys, rooted at the current scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Split a dotted key such as `"database.url"` into segments.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self {
            segments: dotted.split('.').map(str::to_string).collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// The address of the value currently being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Path(KeyPath),
    Index(usize),
}

impl Tag {
    pub fn root() -> Self {
        Tag::Path(KeyPath::root())
    }

    /// The path a nested structure under this tag composes its fields from.
    /// Positional tags open a new scope.
    pub fn scope(&self) -> KeyPath {
        match self {
            Tag::Path(path) => path.clone(),
            Tag::Index(_) => KeyPath::root(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Path(path) => write!(f, "{path}"),
            Tag::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Compute the tag for `field` under `parent` and fetch its node from `scope`.
///
/// A key bound to an explicit `null` is present; a key with no entry at all
/// fails with [`Error::MissingField`], whatever the target type.
pub fn resolve_tag<'t>(
    parent: &KeyPath,
    field: &str,
    scope: &'t Map<String, Value>,
) -> Result<(KeyPath, &'t Value)> {
    let path = parent.child(field);
    match scope.get(field) {
        Some(node) => {
            trace!(tag = %path, "resolved tag");
            Ok((path, node))
        }
        None => Err(Error::MissingField {
            path: path.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {other:?}"),
        }
    }

    #[test]
    fn top_level_tag_is_field_name() {
        let map = scope(json!({"string": "foo"}));
        let (path, node) = resolve_tag(&KeyPath::root(), "string", &map).unwrap();
        assert_eq!(path.to_string(), "string");
        assert_eq!(node, &json!("foo"));
    }

    #[test]
    fn nested_tag_composes_with_dot() {
        let map = scope(json!({"obj": 1}));
        let parent = KeyPath::parse("outer.inner");
        let (path, _) = resolve_tag(&parent, "obj", &map).unwrap();
        assert_eq!(path.to_string(), "outer.inner.obj");
    }

    #[test]
    fn explicit_null_is_present() {
        let map = scope(json!({"optValue": null}));
        let (_, node) = resolve_tag(&KeyPath::root(), "optValue", &map).unwrap();
        assert!(node.is_null());
    }

    #[test]
    fn absent_key_is_missing_field() {
        let map = scope(json!({}));
        let err = resolve_tag(&KeyPath::parse("db"), "url", &map).unwrap_err();
        match err {
            Error::MissingField { path } => assert_eq!(path, "db.url"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn index_tags_open_fresh_scope() {
        assert_eq!(Tag::Index(3).to_string(), "3");
        assert!(Tag::Index(3).scope().is_root());
        let tag = Tag::Path(KeyPath::parse("a.b"));
        assert_eq!(tag.scope(), KeyPath::parse("a.b"));
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(KeyPath::parse("").is_root());
        assert_eq!(KeyPath::parse("a.b").segments().len(), 2);
    }
}
