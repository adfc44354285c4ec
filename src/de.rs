//! Decoding: drive a target type's serde shape over a [`ConfigTree`].
//!
//! The target's `Deserialize` impl is the shape description. Structures are
//! walked over their *declared* field list in declaration order, so:
//!
//! - every declared field must have a node in the tree, an explicit `null`
//!   included, or decoding stops with [`Error::MissingField`]. This holds for
//!   `Option<T>` fields and for fields with `#[serde(default)]` alike.
//! - keys in the tree that the shape doesn't declare are never offered to the
//!   target and are skipped silently.
//!
//! `#[serde(alias = ...)]` is not supported: serde lists aliases among the
//! declared fields, so the walker requires every alias as a key of its own.
//!
//! Scalars must match the node's native kind exactly (a `"1"` string is not
//! a number). Numbers are narrowed to the requested width with `as`
//! semantics. The first failure aborts the whole decode.

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use serde::{Deserialize, forward_to_deserialize_any};
use serde_json::{Map, Number, Value};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::path::{KeyPath, Tag, resolve_tag};
use crate::tree::{ConfigTree, ValueType, render_value};

/// Key of the single-entry tree used by [`decode_scalar`].
const SCALAR_KEY: &str = "value";

/// Decode `T` from a configuration tree.
pub fn from_tree<'t, T: Deserialize<'t>>(tree: &'t ConfigTree) -> Result<T> {
    debug!(origin = tree.origin(), "decoding config tree");
    decode(tree.root(), Tag::root(), tree.origin())
}

/// Decode `T` from any value, including bare scalars and lists.
pub fn from_value<'t, T: Deserialize<'t>>(value: &'t Value) -> Result<T> {
    decode(value, Tag::root(), "value")
}

pub fn from_json_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    from_tree(&ConfigTree::from_json_str(text)?)
}

pub fn from_toml_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    from_tree(&ConfigTree::from_toml_str(text)?)
}

pub fn from_path<T: DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    from_tree(&ConfigTree::from_path(path)?)
}

/// Decode a bare scalar such as `"10s"` or `"yes"`.
///
/// The text is typed as a config literal, wrapped as `{value: <raw>}` and the
/// `value` key is decoded, so errors name `value` as their path.
pub fn decode_scalar<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let tree = ConfigTree::parse_entry(SCALAR_KEY, raw);
    let scope = tree.root().as_object().ok_or_else(|| Error::MissingField {
        path: SCALAR_KEY.into(),
    })?;
    let (path, node) = resolve_tag(&KeyPath::root(), SCALAR_KEY, scope)?;
    decode(node, Tag::Path(path), tree.origin())
}

fn decode<'t, T: Deserialize<'t>>(node: &'t Value, tag: Tag, origin: &'t str) -> Result<T> {
    T::deserialize(ValueDecoder::new(node, tag.clone(), origin)).map_err(|e| e.at(&tag, origin))
}

/// Integer view of a number node; floats truncate.
fn integer(n: &Number) -> i64 {
    if let Some(i) = n.as_i64() {
        i
    } else if let Some(u) = n.as_u64() {
        u as i64
    } else {
        n.as_f64().unwrap_or_default() as i64
    }
}

fn float(n: &Number) -> f64 {
    n.as_f64().unwrap_or_default()
}

/// Decodes the single node addressed by `tag`.
pub(crate) struct ValueDecoder<'t> {
    node: &'t Value,
    tag: Tag,
    origin: &'t str,
}

impl<'t> ValueDecoder<'t> {
    fn new(node: &'t Value, tag: Tag, origin: &'t str) -> Self {
        Self { node, tag, origin }
    }

    fn mismatch(&self, expected: impl std::fmt::Display) -> Error {
        Error::TypeMismatch {
            path: self.tag.to_string(),
            expected: expected.to_string(),
            actual: ValueType::of(self.node).to_string(),
            value: render_value(self.node),
            origin: self.origin.to_string(),
        }
    }

    fn text(&self) -> Result<&'t str> {
        match self.node {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(ValueType::String)),
        }
    }

    fn number(&self) -> Result<&'t Number> {
        match self.node {
            Value::Number(n) => Ok(n),
            _ => Err(self.mismatch(ValueType::Number)),
        }
    }

    fn list(&self) -> Result<&'t [Value]> {
        match self.node {
            Value::Array(items) => Ok(items),
            _ => Err(self.mismatch(ValueType::List)),
        }
    }

    fn object(&self) -> Result<&'t Map<String, Value>> {
        match self.node {
            Value::Object(map) => Ok(map),
            _ => Err(self.mismatch(ValueType::Object)),
        }
    }
}

macro_rules! decode_integer {
    ($($method:ident => $visit:ident($ty:ty),)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            let n = self.number()?;
            visitor.$visit(integer(n) as $ty)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for ValueDecoder<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(float(n))
                }
            }
            Value::String(s) => visitor.visit_borrowed_str(s),
            Value::Array(items) => visitor.visit_seq(SeqDecoder::new(items, self.origin)),
            Value::Object(map) => {
                visitor.visit_map(MapDecoder::new(map, self.tag.scope(), self.origin))
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Value::Bool(b) => visitor.visit_bool(*b),
            _ => Err(self.mismatch(ValueType::Boolean)),
        }
    }

    decode_integer! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let n = self.number()?;
        visitor.visit_f32(float(n) as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let n = self.number()?;
        visitor.visit_f64(float(n))
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.text()?.chars().next() {
            Some(c) => visitor.visit_char(c),
            None => Err(self.mismatch("char")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.text()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_bytes(self.text()?.as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    /// `null` is the only way to get `None`; absence was already rejected
    /// when the field's tag was resolved.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.mismatch(ValueType::Null)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let items = self.list()?;
        visitor.visit_seq(SeqDecoder::new(items, self.origin))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let map = self.object()?;
        visitor.visit_map(MapDecoder::new(map, self.tag.scope(), self.origin))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let scope = self.object()?;
        let parent = self.tag.scope();
        trace!(shape = name, scope = %parent, "decoding structure");
        for key in scope.keys().filter(|k| !fields.contains(&k.as_str())) {
            trace!(key = %parent.child(key), "ignoring unknown key");
        }
        visitor.visit_map(StructWalker {
            scope,
            parent,
            fields,
            next: 0,
            pending: None,
            origin: self.origin,
        })
    }

    /// Unit variants decode from their name; variants with a payload decode
    /// from a single-key object `{Variant: payload}`.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let (tag, origin) = (self.tag.clone(), self.origin);
        let result = match self.node {
            Value::String(s) => {
                visitor.visit_enum(IntoDeserializer::<'de, Error>::into_deserializer(s.as_str()))
            }
            Value::Object(map) => match (map.len(), map.iter().next()) {
                (1, Some((variant, payload))) => {
                    let payload_tag = Tag::Path(self.tag.scope().child(variant));
                    visitor.visit_enum(EnumDecoder {
                        variant: variant.as_str(),
                        payload: ValueDecoder::new(payload, payload_tag, origin),
                    })
                }
                _ => Err(self.mismatch(ValueType::String)),
            },
            _ => Err(self.mismatch(ValueType::String)),
        };
        result.map_err(|e| e.at(&tag, origin))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// Positional decoder over a list; each element is tagged by its index.
struct SeqDecoder<'t> {
    items: std::iter::Enumerate<std::slice::Iter<'t, Value>>,
    origin: &'t str,
}

impl<'t> SeqDecoder<'t> {
    fn new(items: &'t [Value], origin: &'t str) -> Self {
        Self {
            items: items.iter().enumerate(),
            origin,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDecoder<'de> {
    type Error = Error;

    fn next_element_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<Option<S::Value>> {
        // Running off the end is end-of-sequence, not an error.
        let Some((index, node)) = self.items.next() else {
            return Ok(None);
        };
        let tag = Tag::Index(index);
        seed.deserialize(ValueDecoder::new(node, tag.clone(), self.origin))
            .map(Some)
            .map_err(|e| e.at(&tag, self.origin))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Walks a structure's declared fields in declaration order.
struct StructWalker<'t> {
    scope: &'t Map<String, Value>,
    parent: KeyPath,
    fields: &'static [&'static str],
    next: usize,
    pending: Option<(KeyPath, &'t Value)>,
    origin: &'t str,
}

impl<'de> de::MapAccess<'de> for StructWalker<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(field) = self.fields.get(self.next).copied() else {
            return Ok(None);
        };
        self.next += 1;
        self.pending = Some(resolve_tag(&self.parent, field, self.scope)?);
        seed.deserialize(BorrowedStrDeserializer::<Error>::new(field))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (path, node) = self.pending.take().ok_or_else(|| Error::Custom {
            path: self.parent.to_string(),
            message: "value requested before its key".into(),
        })?;
        let tag = Tag::Path(path);
        seed.deserialize(ValueDecoder::new(node, tag.clone(), self.origin))
            .map_err(|e| e.at(&tag, self.origin))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len() - self.next)
    }
}

/// Entries of a map-shaped node, key first, then value. Each value is tagged
/// `<map path>.<key>`, so structures below a map field compose from there.
struct MapDecoder<'t> {
    entries: serde_json::map::Iter<'t>,
    parent: KeyPath,
    pending: Option<(&'t str, &'t Value)>,
    origin: &'t str,
}

impl<'t> MapDecoder<'t> {
    fn new(map: &'t Map<String, Value>, parent: KeyPath, origin: &'t str) -> Self {
        Self {
            entries: map.iter(),
            parent,
            pending: None,
            origin,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDecoder<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((key, node)) = self.entries.next() else {
            return Ok(None);
        };
        let key = key.as_str();
        self.pending = Some((key, node));
        let decoder = KeyDecoder {
            key,
            path: self.parent.child(key),
            origin: self.origin,
        };
        seed.deserialize(decoder).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (key, node) = self.pending.take().ok_or_else(|| Error::Custom {
            path: self.parent.to_string(),
            message: "value requested before its key".into(),
        })?;
        let tag = Tag::Path(self.parent.child(key));
        seed.deserialize(ValueDecoder::new(node, tag.clone(), self.origin))
            .map_err(|e| e.at(&tag, self.origin))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Map keys are always string nodes. String-like key types get the text as
/// is. Unlike a plain string-keyed reading, numeric and boolean key types
/// (`HashMap<u16, _>`) parse the text, and text that doesn't parse is a
/// [`Error::TypeMismatch`] at the key's path.
struct KeyDecoder<'t> {
    key: &'t str,
    path: KeyPath,
    origin: &'t str,
}

impl KeyDecoder<'_> {
    fn mismatch(&self, expected: ValueType) -> Error {
        Error::TypeMismatch {
            path: self.path.to_string(),
            expected: expected.to_string(),
            actual: ValueType::String.to_string(),
            value: self.key.to_string(),
            origin: self.origin.to_string(),
        }
    }
}

macro_rules! decode_key_number {
    ($($method:ident => $visit:ident($ty:ty),)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            match self.key.parse::<$ty>() {
                Ok(n) => visitor.$visit(n),
                Err(_) => Err(self.mismatch(ValueType::Number)),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for KeyDecoder<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_borrowed_str(self.key)
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.key {
            "true" => visitor.visit_bool(true),
            "false" => visitor.visit_bool(false),
            _ => Err(self.mismatch(ValueType::Boolean)),
        }
    }

    decode_key_number! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let tag = Tag::Path(self.path.clone());
        visitor
            .visit_enum(IntoDeserializer::<'de, Error>::into_deserializer(self.key))
            .map_err(|e| e.at(&tag, self.origin))
    }

    forward_to_deserialize_any! {
        i128 u128 char str string bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct EnumDecoder<'t> {
    variant: &'t str,
    payload: ValueDecoder<'t>,
}

impl<'de> de::EnumAccess<'de> for EnumDecoder<'de> {
    type Error = Error;
    type Variant = ValueDecoder<'de>;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, Self::Variant)> {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        Ok((variant, self.payload))
    }
}

impl<'de> de::VariantAccess<'de> for ValueDecoder<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.node {
            Value::Null => Ok(()),
            _ => Err(self.mismatch(ValueType::Null)),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}
