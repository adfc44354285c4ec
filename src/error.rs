use std::fmt::Display;
use std::path::PathBuf;

use serde::{de, ser};
use thiserror::Error;

use crate::path::Tag;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the decoder or encoder can report.
///
/// Decode and encode variants carry the tag of the offending value as their
/// `path` field (see [`Error::path`]). An empty `path` names the root of the
/// tree being decoded.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing field '{path}'")]
    MissingField { path: String },

    #[error(
        "[property name: {path}] type: {expected} was expected, but received type: {actual} with value: '{value}' ({origin})"
    )]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
        value: String,
        origin: String,
    },

    #[error("Unknown enum member '{text}' at '{path}', expected one of: {}", .expected.join(", "))]
    UnknownEnumMember {
        path: String,
        text: String,
        expected: Vec<String>,
    },

    #[error("Value at '{path}' has no canonical form: {reason}")]
    NonCanonicalValue { path: String, reason: String },

    #[error("Invalid value at '{path}': {message}")]
    Custom { path: String, message: String },

    #[error("Failed to parse {origin}: {reason}")]
    Parse { origin: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// The tag of the value this error refers to, for decode and encode errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::MissingField { path }
            | Error::TypeMismatch { path, .. }
            | Error::UnknownEnumMember { path, .. }
            | Error::NonCanonicalValue { path, .. }
            | Error::Custom { path, .. } => Some(path),
            Error::Parse { .. } | Error::Io { .. } => None,
        }
    }

    /// Stamp a position onto an error raised by a `Deserialize` impl that
    /// had no way of knowing where it was. Errors that already carry a
    /// position are returned untouched.
    pub(crate) fn at(self, tag: &Tag, origin: &str) -> Self {
        let mut err = self.at_path(&tag.to_string());
        if let Error::TypeMismatch { origin: o, .. } = &mut err
            && o.is_empty()
        {
            *o = origin.to_string();
        }
        err
    }

    pub(crate) fn at_path(mut self, at: &str) -> Self {
        match &mut self {
            Error::MissingField { path }
            | Error::TypeMismatch { path, .. }
            | Error::UnknownEnumMember { path, .. }
            | Error::NonCanonicalValue { path, .. }
            | Error::Custom { path, .. }
                if path.is_empty() =>
            {
                *path = at.to_string();
            }
            _ => {}
        }
        self
    }
}

/// Native kind name and printable value for a serde `Unexpected`.
fn describe(unexp: &de::Unexpected<'_>) -> (&'static str, String) {
    use de::Unexpected;
    match unexp {
        Unexpected::Bool(b) => ("BOOLEAN", b.to_string()),
        Unexpected::Unsigned(n) => ("NUMBER", n.to_string()),
        Unexpected::Signed(n) => ("NUMBER", n.to_string()),
        Unexpected::Float(n) => ("NUMBER", n.to_string()),
        Unexpected::Char(c) => ("STRING", c.to_string()),
        Unexpected::Str(s) => ("STRING", s.to_string()),
        Unexpected::Unit | Unexpected::Option => ("NULL", "null".into()),
        Unexpected::Seq => ("LIST", "[...]".into()),
        Unexpected::Map => ("OBJECT", "{...}".into()),
        other => ("OTHER", other.to_string()),
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Custom {
            path: String::new(),
            message: msg.to_string(),
        }
    }

    fn invalid_type(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        let (actual, value) = describe(&unexp);
        Error::TypeMismatch {
            path: String::new(),
            expected: exp.to_string(),
            actual: actual.into(),
            value,
            origin: String::new(),
        }
    }

    fn invalid_value(unexp: de::Unexpected<'_>, exp: &dyn de::Expected) -> Self {
        Self::invalid_type(unexp, exp)
    }

    fn unknown_variant(variant: &str, expected: &'static [&'static str]) -> Self {
        Error::UnknownEnumMember {
            path: String::new(),
            text: variant.to_string(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn missing_field(field: &'static str) -> Self {
        Error::MissingField {
            path: field.to_string(),
        }
    }
}

impl ser::Error for Error {
    /// Custom errors from `Serialize` impls mean the value has no exact
    /// textual form (e.g. a mixed-unit period).
    fn custom<T: Display>(msg: T) -> Self {
        Error::NonCanonicalValue {
            path: String::new(),
            reason: msg.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::KeyPath;
    use serde::de::Error as _;

    #[test]
    fn missing_field_formats() {
        let err = Error::MissingField {
            path: "database.url".into(),
        };
        assert!(err.to_string().contains("database.url"));
        assert_eq!(err.path(), Some("database.url"));
    }

    #[test]
    fn type_mismatch_formats_all_parts() {
        let err = Error::TypeMismatch {
            path: "int".into(),
            expected: "NUMBER".into(),
            actual: "STRING".into(),
            value: "text".into(),
            origin: "String: 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[property name: int]"));
        assert!(msg.contains("NUMBER"));
        assert!(msg.contains("STRING"));
        assert!(msg.contains("'text'"));
        assert!(msg.contains("String: 1"));
    }

    #[test]
    fn unknown_variant_lists_members() {
        let err = Error::unknown_variant("FAST", &["fast", "slow"]);
        let msg = err.to_string();
        assert!(msg.contains("FAST"));
        assert!(msg.contains("fast, slow"));
    }

    #[test]
    fn stamping_fills_only_empty_positions() {
        let tag = Tag::Path(KeyPath::root().child("outer").child("inner"));
        let err = Error::invalid_type(de::Unexpected::Str("x"), &"a number").at(&tag, "test");
        match err {
            Error::TypeMismatch { path, origin, .. } => {
                assert_eq!(path, "outer.inner");
                assert_eq!(origin, "test");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }

        let placed = Error::MissingField {
            path: "already".into(),
        }
        .at(&tag, "test");
        assert_eq!(placed.path(), Some("already"));
    }

    #[test]
    fn io_error_has_no_path() {
        let err = Error::Io {
            path: "/nope.toml".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.path(), None);
        assert!(err.to_string().contains("/nope.toml"));
    }
}
