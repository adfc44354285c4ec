//! Encoding: render any `Serialize` value as indented config text.
//!
//! A custom serde `Serializer` first builds a [`Node`] tree that keeps
//! structure fields in declaration order, then the tree is rendered:
//!
//! ```text
//! {
//!   name: web-01,
//!   timeout: 30s,
//!   tags: [
//!     blue,
//!     "two words"
//!   ]
//! }
//! ```
//!
//! Every scalar token is written so that reading it back as a config literal
//! yields the same kind: strings that would re-read as `null`, a boolean or a
//! number are quoted, and so is anything outside `[A-Za-z0-9_.+-]`. Unit
//! types (durations, periods, memory sizes) serialize as their canonical
//! text. A value with no canonical form fails with
//! [`Error::NonCanonicalValue`] naming its path.

use serde::Serialize;
use serde::ser::{self, Impossible};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::tree::parse_literal;

/// Encoded form of a value before rendering.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// A scalar, already in its final textual form.
    Token(String),
    List(Vec<Node>),
    /// Entries in serialization order. Keys are raw; quoting happens on render.
    Object(Vec<(String, Node)>),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Token(text) => parse_literal(&text),
            Node::List(items) => Value::Array(items.into_iter().map(Node::into_value).collect()),
            Node::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, node)| (key, node.into_value()))
                    .collect(),
            ),
        }
    }
}

/// Renders values as config text.
///
/// ```ignore
/// let text = Encoder::new().indent(4).encode(&settings)?;
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    indent: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spaces per nesting level.
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        debug!(indent = self.indent, "encoding value");
        let node = build(value)?;
        let mut out = String::new();
        self.render(&node, 0, &mut out);
        Ok(out)
    }

    fn render(&self, node: &Node, depth: usize, out: &mut String) {
        match node {
            Node::Token(text) => out.push_str(text),
            Node::List(items) if items.is_empty() => out.push_str("[]"),
            Node::Object(entries) if entries.is_empty() => out.push_str("{}"),
            Node::List(items) => {
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    self.pad(depth + 1, out);
                    self.render(item, depth + 1, out);
                }
                out.push('\n');
                self.pad(depth, out);
                out.push(']');
            }
            Node::Object(entries) => {
                out.push_str("{\n");
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    self.pad(depth + 1, out);
                    out.push_str(&render_key(key));
                    out.push_str(": ");
                    self.render(value, depth + 1, out);
                }
                out.push('\n');
                self.pad(depth, out);
                out.push('}');
            }
        }
    }

    fn pad(&self, depth: usize, out: &mut String) {
        out.extend(std::iter::repeat_n(' ', depth * self.indent));
    }
}

/// Encode with the default two-space indent.
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Encoder::new().encode(value)
}

/// The tree the encoded text reads back as: every token is re-typed as a
/// config literal. Decoding the result gives back the original value.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(build(value)?.into_value())
}

fn build<T: Serialize + ?Sized>(value: &T) -> Result<Node> {
    value.serialize(NodeSerializer {
        path: String::new(),
    })
}

/// Text that re-reads as the same string without quotes.
fn is_bare(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
        && !matches!(text, "null" | "true" | "false")
        && text.parse::<f64>().is_err()
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn render_string(text: &str) -> String {
    if is_bare(text) {
        text.to_string()
    } else {
        quote(text)
    }
}

// Keys never get re-typed, so numeric keys such as `123` stay bare.
fn render_key(key: &str) -> String {
    if is_bare(key) || (!key.is_empty() && key.chars().all(|c| c.is_ascii_digit())) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn float_token(path: &str, text: String, finite: bool) -> Result<Node> {
    if finite {
        Ok(Node::Token(text))
    } else {
        Err(Error::NonCanonicalValue {
            path: path.to_string(),
            reason: format!("{text} is not a finite number"),
        })
    }
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn wrap(variant: Option<&'static str>, node: Node) -> Node {
    match variant {
        Some(name) => Node::Object(vec![(name.to_string(), node)]),
        None => node,
    }
}

/// Serialize `value` at `path`, stamping the path onto errors raised by the
/// value's own `Serialize` impl.
fn encode_at<T: Serialize + ?Sized>(path: String, value: &T) -> Result<Node> {
    value
        .serialize(NodeSerializer { path: path.clone() })
        .map_err(|e| e.at_path(&path))
}

struct NodeSerializer {
    path: String,
}

impl ser::Serializer for NodeSerializer {
    type Ok = Node;
    type Error = Error;
    type SerializeSeq = SeqEncoder;
    type SerializeTuple = SeqEncoder;
    type SerializeTupleStruct = SeqEncoder;
    type SerializeTupleVariant = SeqEncoder;
    type SerializeMap = MapEncoder;
    type SerializeStruct = StructEncoder;
    type SerializeStructVariant = StructEncoder;

    fn serialize_bool(self, v: bool) -> Result<Node> {
        Ok(Node::Token(v.to_string()))
    }

    fn serialize_i8(self, v: i8) -> Result<Node> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<Node> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<Node> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<Node> {
        Ok(Node::Token(v.to_string()))
    }

    fn serialize_u8(self, v: u8) -> Result<Node> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<Node> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<Node> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<Node> {
        Ok(Node::Token(v.to_string()))
    }

    // Debug formatting is the shortest text that reads back exactly and
    // always carries a `.` or exponent.
    fn serialize_f32(self, v: f32) -> Result<Node> {
        float_token(&self.path, format!("{v:?}"), v.is_finite())
    }

    fn serialize_f64(self, v: f64) -> Result<Node> {
        float_token(&self.path, format!("{v:?}"), v.is_finite())
    }

    fn serialize_char(self, v: char) -> Result<Node> {
        self.serialize_str(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<Node> {
        Ok(Node::Token(render_string(v)))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Node> {
        Ok(Node::List(
            v.iter().map(|b| Node::Token(b.to_string())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Node> {
        Ok(Node::Token("null".into()))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Node> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node> {
        self.serialize_none()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Node> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node> {
        let inner = encode_at(dotted(&self.path, variant), value)?;
        Ok(wrap(Some(variant), inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqEncoder> {
        Ok(SeqEncoder {
            path: self.path,
            variant: None,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqEncoder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqEncoder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqEncoder> {
        Ok(SeqEncoder {
            path: dotted(&self.path, variant),
            variant: Some(variant),
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapEncoder> {
        Ok(MapEncoder {
            path: self.path,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<StructEncoder> {
        Ok(StructEncoder {
            path: self.path,
            variant: None,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructEncoder> {
        Ok(StructEncoder {
            path: dotted(&self.path, variant),
            variant: Some(variant),
            fields: Vec::with_capacity(len),
        })
    }
}

// --- Structures ---

struct StructEncoder {
    path: String,
    variant: Option<&'static str>,
    fields: Vec<(String, Node)>,
}

impl ser::SerializeStruct for StructEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        let node = encode_at(dotted(&self.path, key), value)?;
        self.fields.push((key.to_string(), node));
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(wrap(self.variant, Node::Object(self.fields)))
    }
}

impl ser::SerializeStructVariant for StructEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeStruct::end(self)
    }
}

// --- Maps ---

struct MapEncoder {
    path: String,
    entries: Vec<(String, Node)>,
    key: Option<String>,
}

impl ser::SerializeMap for MapEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        let key = key
            .serialize(KeySerializer)
            .map_err(|e| e.at_path(&self.path))?;
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self.key.take().ok_or_else(|| Error::Custom {
            path: self.path.clone(),
            message: "map value serialized before its key".into(),
        })?;
        let node = encode_at(dotted(&self.path, &key), value)?;
        self.entries.push((key, node));
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(Node::Object(self.entries))
    }
}

// --- Sequences ---

struct SeqEncoder {
    path: String,
    variant: Option<&'static str>,
    items: Vec<Node>,
}

impl ser::SerializeSeq for SeqEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let path = format!("{}[{}]", self.path, self.items.len());
        let node = encode_at(path, value)?;
        self.items.push(node);
        Ok(())
    }

    fn end(self) -> Result<Node> {
        Ok(wrap(self.variant, Node::List(self.items)))
    }
}

impl ser::SerializeTuple for SeqEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqEncoder {
    type Ok = Node;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node> {
        ser::SerializeSeq::end(self)
    }
}

// --- Map keys: scalars only, as their plain text ---

struct KeySerializer;

fn not_a_key() -> Error {
    Error::NonCanonicalValue {
        path: String::new(),
        reason: "map keys must be strings, numbers or booleans".into(),
    }
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;
    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_bool(self, v: bool) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_f32(self, v: f32) -> Result<String> {
        self.serialize_f64(v as f64)
    }
    fn serialize_f64(self, v: f64) -> Result<String> {
        if v.is_finite() {
            Ok(v.to_string())
        } else {
            Err(not_a_key())
        }
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<String> {
        Err(not_a_key())
    }
    fn serialize_none(self) -> Result<String> {
        Err(not_a_key())
    }
    fn serialize_some<T: Serialize + ?Sized>(self, v: &T) -> Result<String> {
        v.serialize(self)
    }
    fn serialize_unit(self) -> Result<String> {
        Err(not_a_key())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<String> {
        Err(not_a_key())
    }
    fn serialize_unit_variant(self, _: &'static str, _: u32, v: &'static str) -> Result<String> {
        Ok(v.to_string())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        v: &T,
    ) -> Result<String> {
        v.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<String> {
        Err(not_a_key())
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(not_a_key())
    }
    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple> {
        Err(not_a_key())
    }
    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(not_a_key())
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(not_a_key())
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap> {
        Err(not_a_key())
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct> {
        Err(not_a_key())
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(not_a_key())
    }
}
