//! Serde adapter for [`std::time::Duration`] as unit-suffixed text.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Timeouts {
//!     #[serde(with = "treefig::duration")]
//!     connect: Duration,
//! }
//! ```
//!
//! Decoding accepts `<number><unit>` with units `ns us ms s m h d` (and their
//! long spellings); no unit, or a bare number node, means milliseconds.
//! Encoding picks the largest unit that divides the value exactly, so
//! `1000ns` comes back as `"1us"`.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

use crate::units::{scale_unsigned, split_number_unit};

const NANOS_PER_SEC: u128 = 1_000_000_000;

const DECODE_UNITS: &[(&[&str], u128)] = &[
    (&["ns", "nano", "nanos", "nanosecond", "nanoseconds"], 1),
    (&["us", "micro", "micros", "microsecond", "microseconds"], 1_000),
    (&["", "ms", "milli", "millis", "millisecond", "milliseconds"], 1_000_000),
    (&["s", "second", "seconds"], NANOS_PER_SEC),
    (&["m", "minute", "minutes"], 60 * NANOS_PER_SEC),
    (&["h", "hour", "hours"], 3_600 * NANOS_PER_SEC),
    (&["d", "day", "days"], 86_400 * NANOS_PER_SEC),
];

// Largest first; nanoseconds is the fallback.
const ENCODE_UNITS: &[(&str, u128)] = &[
    ("d", 86_400 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("s", NANOS_PER_SEC),
    ("ms", 1_000_000),
    ("us", 1_000),
];

/// Parse text such as `"10s"`, `"1.5 hours"` or `"250"` (milliseconds).
pub fn parse(text: &str) -> Option<Duration> {
    let (number, unit) = split_number_unit(text);
    let factor = DECODE_UNITS
        .iter()
        .find(|(names, _)| names.contains(&unit))
        .map(|(_, factor)| *factor)?;
    from_nanos(scale_unsigned(number, factor)?)
}

fn from_nanos(total: u128) -> Option<Duration> {
    let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Canonical text: the largest whole unit that divides the value.
pub fn format(duration: &Duration) -> String {
    let total = duration.as_nanos();
    if total == 0 {
        return "0s".into();
    }
    for (unit, factor) in ENCODE_UNITS {
        if total % factor == 0 {
            return format!("{}{unit}", total / factor);
        }
    }
    format!("{total}ns")
}

pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(duration))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("duration")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
        parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
        Ok(Duration::from_millis(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
        u64::try_from(v)
            .map(Duration::from_millis)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Duration, E> {
        Duration::try_from_secs_f64(v / 1_000.0)
            .map_err(|_| E::invalid_value(de::Unexpected::Float(v), &self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_unit() {
        assert_eq!(parse("1ns"), Some(Duration::from_nanos(1)));
        assert_eq!(parse("1us"), Some(Duration::from_micros(1)));
        assert_eq!(parse("1ms"), Some(Duration::from_millis(1)));
        assert_eq!(parse("1s"), Some(Duration::from_secs(1)));
        assert_eq!(parse("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse("1h"), Some(Duration::from_secs(3_600)));
        assert_eq!(parse("1d"), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn parses_long_spellings_and_spaces() {
        assert_eq!(parse("2 seconds"), Some(Duration::from_secs(2)));
        assert_eq!(parse("3 minutes"), Some(Duration::from_secs(180)));
        assert_eq!(parse("5 nanos"), Some(Duration::from_nanos(5)));
    }

    #[test]
    fn bare_number_is_millis() {
        assert_eq!(parse("250"), Some(Duration::from_millis(250)));
    }

    #[test]
    fn decimal_values() {
        assert_eq!(parse("1.5s"), Some(Duration::from_millis(1_500)));
        assert_eq!(parse("0.5h"), Some(Duration::from_secs(1_800)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("abc"), None);
        assert_eq!(parse("10 fortnights"), None);
        assert_eq!(parse("-1s"), None);
        assert_eq!(parse(""), None);
    }

    #[derive(serde::Deserialize, Debug)]
    struct Timeout(#[serde(with = "super")] Duration);

    fn from_number(v: f64) -> Result<Duration, serde_json::Error> {
        serde_json::from_value::<Timeout>(serde_json::json!(v)).map(|t| t.0)
    }

    #[test]
    fn fractional_number_is_millis() {
        let nanos = from_number(2.5).unwrap().as_nanos() as i128;
        assert!((nanos - 2_500_000).abs() <= 1, "{nanos}");
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        assert!(from_number(1e30).is_err());
        assert!(from_number(-1.5).is_err());
    }

    #[test]
    fn formats_with_largest_exact_unit() {
        assert_eq!(format(&Duration::from_nanos(1)), "1ns");
        assert_eq!(format(&Duration::from_nanos(1_000)), "1us");
        assert_eq!(format(&Duration::from_millis(1)), "1ms");
        assert_eq!(format(&Duration::from_secs(1)), "1s");
        assert_eq!(format(&Duration::from_secs(60)), "1m");
        assert_eq!(format(&Duration::from_secs(3_600)), "1h");
        assert_eq!(format(&Duration::from_secs(86_400)), "1d");
        assert_eq!(format(&Duration::from_secs(90)), "90s");
        assert_eq!(format(&Duration::from_millis(1_500)), "1500ms");
        assert_eq!(format(&Duration::new(1, 1)), "1000000001ns");
        assert_eq!(format(&Duration::ZERO), "0s");
    }

    #[test]
    fn canonical_text_reads_back() {
        for d in [
            Duration::from_nanos(7),
            Duration::from_micros(15),
            Duration::from_millis(1_500),
            Duration::from_secs(90),
            Duration::from_secs(7_200),
            Duration::from_secs(3 * 86_400),
        ] {
            assert_eq!(parse(&format(&d)), Some(d));
        }
    }
}
