//! Configuration trees: the read-only source the decoder walks.
//!
//! A [`ConfigTree`] is an object-rooted `serde_json::Value` plus a short
//! description of where it came from, used in error messages. Trees are built
//! from JSON or TOML text, from files, or from a single `key: literal` pair.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::path::KeyPath;

/// Native kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Object,
    List,
    Number,
    Boolean,
    Null,
    String,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::List,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Null => ValueType::Null,
            Value::String(_) => ValueType::String,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Object => "OBJECT",
            ValueType::List => "LIST",
            ValueType::Number => "NUMBER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Null => "NULL",
            ValueType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// Render a node's value for error messages. Strings appear without quotes.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An object-rooted configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    root: Value,
    origin: String,
}

impl ConfigTree {
    /// Wrap an existing value. The root must be an object.
    pub fn from_value(root: Value, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        if !root.is_object() {
            return Err(Error::Parse {
                reason: format!(
                    "root must be an object, found {}",
                    ValueType::of(&root)
                ),
                origin,
            });
        }
        Ok(Self { root, origin })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::json_with_origin(text, "json string".into())
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::toml_with_origin(text, "toml string".into())
    }

    /// Load a `.json` or `.toml` file. The file path becomes the origin.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let origin = path.display().to_string();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::json_with_origin(&content, origin),
            Some("toml") => Self::toml_with_origin(&content, origin),
            other => Err(Error::Parse {
                origin,
                reason: format!("unsupported file extension {other:?}, expected json or toml"),
            }),
        }
    }

    /// Build a one-entry tree `{key: raw}`, typing `raw` the way a config
    /// literal would be typed.
    pub fn parse_entry(key: &str, raw: &str) -> Self {
        let mut map = Map::new();
        map.insert(key.to_string(), parse_literal(raw));
        Self {
            root: Value::Object(map),
            origin: format!("literal '{raw}'"),
        }
    }

    fn json_with_origin(text: &str, origin: String) -> Result<Self> {
        let root: Value = serde_json::from_str(text).map_err(|e| Error::Parse {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::from_value(root, origin)
    }

    fn toml_with_origin(text: &str, origin: String) -> Result<Self> {
        let table: toml::Table = text.parse().map_err(|e: toml::de::Error| Error::Parse {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::from_value(toml_to_json(toml::Value::Table(table)), origin)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Whether `path` is present, either with a value or an explicit null.
    pub fn has_path(&self, path: &str) -> bool {
        self.get_value(path).is_some()
    }

    /// Whether a present `path` holds the null marker.
    pub fn is_null(&self, path: &str) -> bool {
        matches!(self.get_value(path), Some(Value::Null))
    }

    /// Navigate by dotted path (e.g. `"database.url"`).
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        self.lookup(&KeyPath::parse(path))
    }

    pub fn lookup(&self, path: &KeyPath) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Deep-merge `fallback` underneath this tree: keys present here win, and
    /// objects present on both sides are merged recursively.
    pub fn with_fallback(self, fallback: ConfigTree) -> ConfigTree {
        let root = match (fallback.root, self.root) {
            (Value::Object(base), Value::Object(overlay)) => Value::Object(deep_merge(base, overlay)),
            (_, overlay) => overlay,
        };
        ConfigTree {
            root,
            origin: self.origin,
        }
    }
}

/// Deep-merge `overlay` on top of `base`.
fn deep_merge(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Object(base_obj)), Value::Object(overlay_obj)) => {
                base.insert(key, Value::Object(deep_merge(base_obj, overlay_obj)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Type a bare literal: null → bool → integer → float → string.
/// Double-quoted text is always a string.
pub(crate) fn parse_literal(raw: &str) -> Value {
    let s = raw.trim();
    if s.starts_with('"')
        && let Ok(text) = serde_json::from_str::<String>(s)
    {
        return Value::String(text);
    }
    match s {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = s.parse::<u64>() {
        return Value::Number(u.into());
    }
    // Only treat as float with a dot or exponent, so "NaN" / "inf" stay text.
    if s.contains(['.', 'e', 'E'])
        && let Ok(f) = s.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => match Number::from_f64(f) {
            Some(n) => Value::Number(n),
            None => Value::String(f.to_string()),
        },
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn tree(value: Value) -> ConfigTree {
        ConfigTree::from_value(value, "test").unwrap()
    }

    #[test]
    fn root_must_be_object() {
        let err = ConfigTree::from_value(json!([1, 2]), "test").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("LIST"));
    }

    #[test]
    fn has_path_distinguishes_null_from_absent() {
        let t = tree(json!({"optValue": null, "db": {"url": "pg://"}}));
        assert!(t.has_path("optValue"));
        assert!(t.is_null("optValue"));
        assert!(t.has_path("db.url"));
        assert!(!t.is_null("db.url"));
        assert!(!t.has_path("missing"));
        assert!(!t.is_null("missing"));
        assert!(!t.has_path("db.url.deeper"));
    }

    #[test]
    fn get_value_nested() {
        let t = tree(json!({"a": {"b": {"c": 42}}}));
        assert_eq!(t.get_value("a.b.c"), Some(&json!(42)));
        assert_eq!(t.get_value("a.x"), None);
    }

    #[test]
    fn value_types_have_uppercase_names() {
        assert_eq!(ValueType::of(&json!("x")).to_string(), "STRING");
        assert_eq!(ValueType::of(&json!(1)).to_string(), "NUMBER");
        assert_eq!(ValueType::of(&json!(null)).to_string(), "NULL");
        assert_eq!(ValueType::of(&json!({})).to_string(), "OBJECT");
        assert_eq!(ValueType::of(&json!([])).to_string(), "LIST");
        assert_eq!(ValueType::of(&json!(true)).to_string(), "BOOLEAN");
    }

    #[test]
    fn json_text_parses() {
        let t = ConfigTree::from_json_str(r#"{"string": "foo", "n": 1}"#).unwrap();
        assert_eq!(t.get_value("string"), Some(&json!("foo")));
        assert_eq!(t.origin(), "json string");
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = ConfigTree::from_json_str("{nope").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn toml_text_parses_with_sections() {
        let t = ConfigTree::from_toml_str(
            "host = \"localhost\"\nwhen = 1979-05-27\n[database]\npool_size = 5\nratio = 0.5\n",
        )
        .unwrap();
        assert_eq!(t.get_value("host"), Some(&json!("localhost")));
        assert_eq!(t.get_value("database.pool_size"), Some(&json!(5)));
        assert_eq!(t.get_value("database.ratio"), Some(&json!(0.5)));
        assert_eq!(t.get_value("when"), Some(&json!("1979-05-27")));
    }

    #[test]
    fn from_path_reads_toml_and_json() {
        let dir = TempDir::new().unwrap();
        let toml_path = dir.path().join("app.toml");
        fs::write(&toml_path, "port = 3000\n").unwrap();
        let t = ConfigTree::from_path(&toml_path).unwrap();
        assert_eq!(t.get_value("port"), Some(&json!(3000)));
        assert!(t.origin().ends_with("app.toml"));

        let json_path = dir.path().join("app.json");
        fs::write(&json_path, r#"{"port": 4000}"#).unwrap();
        let t = ConfigTree::from_path(&json_path).unwrap();
        assert_eq!(t.get_value("port"), Some(&json!(4000)));
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigTree::from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, "port = 1").unwrap();
        let err = ConfigTree::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn parse_entry_types_literals() {
        let cases = [
            ("null", json!(null)),
            ("true", json!(true)),
            ("false", json!(false)),
            ("42", json!(42)),
            ("-5", json!(-5)),
            ("1.5", json!(1.5)),
            ("1us", json!("1us")),
            ("yes", json!("yes")),
            ("\"true\"", json!("true")),
            ("NaN", json!("NaN")),
        ];
        for (raw, expected) in cases {
            let t = ConfigTree::parse_entry("k", raw);
            assert_eq!(t.get_value("k"), Some(&expected), "literal {raw}");
        }
    }

    #[test]
    fn fallback_fills_gaps_and_merges_objects() {
        let primary = tree(json!({"port": 3000, "db": {"pool_size": 20}}));
        let fallback = tree(json!({"port": 8080, "host": "x", "db": {"url": "pg://", "pool_size": 5}}));
        let merged = primary.with_fallback(fallback);
        assert_eq!(merged.get_value("port"), Some(&json!(3000)));
        assert_eq!(merged.get_value("host"), Some(&json!("x")));
        assert_eq!(merged.get_value("db.url"), Some(&json!("pg://")));
        assert_eq!(merged.get_value("db.pool_size"), Some(&json!(20)));
    }

    #[test]
    fn fallback_scalar_replaced_by_object() {
        let primary = tree(json!({"db": {"url": "x"}}));
        let fallback = tree(json!({"db": "flat"}));
        let merged = primary.with_fallback(fallback);
        assert_eq!(merged.get_value("db.url"), Some(&json!("x")));
    }

    #[test]
    fn render_value_unquotes_strings() {
        assert_eq!(render_value(&json!("text")), "text");
        assert_eq!(render_value(&json!(1.5)), "1.5");
        assert_eq!(render_value(&json!(null)), "null");
    }
}
