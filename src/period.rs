use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser};

use crate::units::{NonCanonical, split_number_unit};

/// A calendar period of whole years, months and days.
///
/// Text forms are `Nd`, `Nw`, `Nm` and `Ny` (plus long spellings such as
/// `3 weeks`). A bare number means days. Only single-unit periods have a
/// canonical form; `1y 2m` cannot be encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Period {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Period {
    pub const ZERO: Period = Period::new(0, 0, 0);

    pub const fn new(years: i32, months: i32, days: i32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    pub const fn days(days: i32) -> Self {
        Self::new(0, 0, days)
    }

    pub const fn weeks(weeks: i32) -> Self {
        Self::new(0, 0, weeks * 7)
    }

    pub const fn months(months: i32) -> Self {
        Self::new(0, months, 0)
    }

    pub const fn years(years: i32) -> Self {
        Self::new(years, 0, 0)
    }

    pub fn parse(text: &str) -> Option<Self> {
        let (number, unit) = split_number_unit(text);
        let n: i32 = number.parse().ok()?;
        match unit {
            "" | "d" | "day" | "days" => Some(Self::days(n)),
            "w" | "week" | "weeks" => n.checked_mul(7).map(Self::days),
            "m" | "mo" | "month" | "months" => Some(Self::months(n)),
            "y" | "year" | "years" => Some(Self::years(n)),
            _ => None,
        }
    }

    /// Canonical text, failing for periods that mix units.
    pub fn to_canonical(&self) -> Result<String, NonCanonical> {
        let Period {
            years,
            months,
            days,
        } = *self;
        if days != 0 {
            if months != 0 || years != 0 {
                return Err(self.mixed());
            }
            if days % 7 == 0 {
                return Ok(format!("{}w", days / 7));
            }
            return Ok(format!("{days}d"));
        }
        if months != 0 {
            if years != 0 {
                return Err(self.mixed());
            }
            return Ok(format!("{months}m"));
        }
        if years != 0 {
            return Ok(format!("{years}y"));
        }
        Ok("0d".into())
    }

    fn mixed(&self) -> NonCanonical {
        NonCanonical(format!(
            "period {}y {}m {}d mixes units and is not convertible",
            self.years, self.months, self.days
        ))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_canonical().map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PeriodVisitor)
    }
}

struct PeriodVisitor;

impl Visitor<'_> for PeriodVisitor {
    type Value = Period;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("period")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Period, E> {
        Period::parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Period, E> {
        i32::try_from(v)
            .map(Period::days)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Period, E> {
        i32::try_from(v)
            .map(Period::days)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(Period::parse("1d"), Some(Period::days(1)));
        assert_eq!(Period::parse("1w"), Some(Period::days(7)));
        assert_eq!(Period::parse("1m"), Some(Period::months(1)));
        assert_eq!(Period::parse("1y"), Some(Period::years(1)));
        assert_eq!(Period::parse("3 weeks"), Some(Period::days(21)));
        assert_eq!(Period::parse("2 mo"), Some(Period::months(2)));
        assert_eq!(Period::parse("10"), Some(Period::days(10)));
        assert_eq!(Period::parse("-2d"), Some(Period::days(-2)));
    }

    #[test]
    fn rejects_bad_text() {
        assert_eq!(Period::parse("1.5d"), None);
        assert_eq!(Period::parse("1 fortnight"), None);
        assert_eq!(Period::parse("d"), None);
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(Period::days(7).to_canonical().unwrap(), "1w");
        assert_eq!(Period::days(1).to_canonical().unwrap(), "1d");
        assert_eq!(Period::days(10).to_canonical().unwrap(), "10d");
        assert_eq!(Period::months(1).to_canonical().unwrap(), "1m");
        assert_eq!(Period::years(1).to_canonical().unwrap(), "1y");
        assert_eq!(Period::ZERO.to_canonical().unwrap(), "0d");
    }

    #[test]
    fn mixed_units_are_not_canonical() {
        assert!(Period::new(1, 1, 0).to_canonical().is_err());
        assert!(Period::new(0, 1, 1).to_canonical().is_err());
        let err = Period::new(1, 2, 3).to_canonical().unwrap_err();
        assert!(err.to_string().contains("1y 2m 3d"));
    }

    #[test]
    fn canonical_text_reads_back() {
        for p in [
            Period::days(3),
            Period::weeks(2),
            Period::months(5),
            Period::years(4),
            Period::days(-14),
        ] {
            let text = p.to_canonical().unwrap();
            assert_eq!(Period::parse(&text), Some(p));
        }
    }
}
