use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::units::{scale_unsigned, split_number_unit};

const KIB: u128 = 1 << 10;
const KB: u128 = 1_000;

const DECODE_UNITS: &[(&[&str], u128)] = &[
    (&["", "B", "b", "byte", "bytes"], 1),
    (&["K", "k", "Ki", "KiB", "kibibyte", "kibibytes"], KIB),
    (&["M", "m", "Mi", "MiB", "mebibyte", "mebibytes"], KIB.pow(2)),
    (&["G", "g", "Gi", "GiB", "gibibyte", "gibibytes"], KIB.pow(3)),
    (&["T", "t", "Ti", "TiB", "tebibyte", "tebibytes"], KIB.pow(4)),
    (&["P", "p", "Pi", "PiB", "pebibyte", "pebibytes"], KIB.pow(5)),
    (&["E", "e", "Ei", "EiB", "exbibyte", "exbibytes"], KIB.pow(6)),
    (&["kB", "kilobyte", "kilobytes"], KB),
    (&["MB", "megabyte", "megabytes"], KB.pow(2)),
    (&["GB", "gigabyte", "gigabytes"], KB.pow(3)),
    (&["TB", "terabyte", "terabytes"], KB.pow(4)),
    (&["PB", "petabyte", "petabytes"], KB.pow(5)),
    (&["EB", "exabyte", "exabytes"], KB.pow(6)),
];

const ENCODE_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// A size in bytes, written with binary unit suffixes (`512KiB`, `1GiB`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemorySize(u64);

impl MemorySize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Parse `"1MiB"`, `"1.5 GB"` or `"4096"`. Fractional bytes are truncated.
    pub fn parse(text: &str) -> Option<Self> {
        let (number, unit) = split_number_unit(text);
        let factor = DECODE_UNITS
            .iter()
            .find(|(names, _)| names.contains(&unit))
            .map(|(_, factor)| *factor)?;
        let bytes = scale_unsigned(number, factor)?;
        u64::try_from(bytes).ok().map(Self)
    }

    /// Canonical text: divide by 1024 while the value stays whole.
    pub fn to_canonical(self) -> String {
        if self.0 == 0 {
            return "0B".into();
        }
        let mut value = self.0;
        let mut unit = 0;
        while value % 1024 == 0 && unit < ENCODE_UNITS.len() - 1 {
            value /= 1024;
            unit += 1;
        }
        format!("{value}{}", ENCODE_UNITS[unit])
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl From<u64> for MemorySize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl Serialize for MemorySize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for MemorySize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MemorySizeVisitor)
    }
}

struct MemorySizeVisitor;

impl Visitor<'_> for MemorySizeVisitor {
    type Value = MemorySize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory size")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MemorySize, E> {
        MemorySize::parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MemorySize, E> {
        Ok(MemorySize(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MemorySize, E> {
        u64::try_from(v)
            .map(MemorySize)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }
}
