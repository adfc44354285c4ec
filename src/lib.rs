//! Typed decoding and encoding of configuration trees. Define a struct,
//! hand over a tree, and get the struct back, or get readable config text
//! out of it.
//!
//! ```ignore
//! #[derive(Deserialize, Serialize)]
//! struct Server {
//!     host: String,
//!     #[serde(with = "treefig::duration")]
//!     timeout: Duration,
//!     body_limit: MemorySize,
//! }
//!
//! let server: Server = treefig::from_toml_str(text)?;
//! println!("{}", treefig::to_string(&server)?);
//! ```
//!
//! # Design: the type is the shape
//!
//! The target's serde derive is the only schema. Decoding walks the type's
//! declared fields in declaration order and looks each one up in the tree:
//!
//! - **Every declared field must be present.** A key bound to an explicit
//!   `null` is present and decodes to `None`; a key that is absent fails with
//!   [`Error::MissingField`], even for `Option<T>` and `#[serde(default)]`
//!   fields.
//! - **Unknown keys are ignored.** Keys the type doesn't declare are skipped
//!   silently (logged at `trace` level).
//! - **Kinds are strict.** A string `"1"` is not a number and `"yes"` is not
//!   a boolean, unless the field opts into a lenient codec.
//! - **No field aliases.** `#[serde(alias = ...)]` names are treated as
//!   further required keys, so a struct using them only decodes when every
//!   alias is present too.
//! - **The first error wins.** Decoding aborts on the first failure, and the
//!   error names the value's position.
//!
//! # Positions
//!
//! Each value being decoded has a tag. Fields nested in structures compose
//! dotted paths (`inner.obj.string`). List elements are tagged by their
//! index, and a structure inside a list element starts a fresh scope, so a
//! missing field there is reported by its bare name. Map values extend the
//! map's path with their key (`map.123.objects`). See [`path`].
//!
//! # Unit-suffixed scalars
//!
//! | Type | Module / type | Reads | Writes |
//! |---|---|---|---|
//! | `Duration` | [`duration`] (serde `with`) | `10s`, `1.5 hours`, `250` (ms) | largest exact unit: `1us`, `90s` |
//! | calendar period | [`Period`] | `3d`, `2w`, `1m`, `1y` | `1w`, `10d`, `1m`; mixed units fail |
//! | memory size | [`MemorySize`] | `512KiB`, `1 GB`, `4096` | largest binary unit: `1MiB` |
//! | lenient boolean | [`lenient_bool`] (serde `with`) | `true/yes/on`, `false/no/off` | `true` / `false` |
//!
//! # Encoding
//!
//! [`to_string`] renders any `Serialize` value as indented config text with
//! fields in declaration order; [`Encoder`] adjusts the indent width. Values
//! with no canonical text form (a `1y 2m` period, a NaN) fail with
//! [`Error::NonCanonicalValue`] carrying the value's path. [`to_value`] gives
//! the tree the text reads back as, which decodes to the original value.
//!
//! # Sources
//!
//! [`ConfigTree`] loads JSON or TOML text or files and layers trees with
//! [`ConfigTree::with_fallback`]. [`decode_scalar`] decodes a bare literal
//! such as `"10s"` without a surrounding object.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events: `debug` when a decode or encode
//! starts, `trace` for each resolved field and each ignored key. It never
//! installs a subscriber.

pub mod duration;
pub mod error;
pub mod lenient_bool;
pub mod path;
pub mod tree;

mod de;
mod memory;
mod period;
mod ser;
mod units;

#[cfg(test)]
mod fixtures;

pub use de::{decode_scalar, from_json_str, from_path, from_toml_str, from_tree, from_value};
pub use error::{Error, Result};
pub use memory::MemorySize;
pub use path::{KeyPath, Tag, resolve_tag};
pub use period::Period;
pub use ser::{Encoder, to_string, to_value};
pub use tree::{ConfigTree, ValueType};
pub use units::NonCanonical;
