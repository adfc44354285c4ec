//! Shared pieces of the unit-suffixed scalar codecs.

use thiserror::Error;

/// A value that has no exact canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NonCanonical(pub String);

/// Split `"10 ms"` into `("10", "ms")`. The unit is the trailing run of
/// alphabetic characters; either side may be empty.
pub(crate) fn split_number_unit(text: &str) -> (&str, &str) {
    let trimmed = text.trim();
    let unit_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphabetic())
        .last()
        .map_or(trimmed.len(), |(i, _)| i);
    let (number, unit) = trimmed.split_at(unit_start);
    (number.trim_end(), unit)
}

/// Scale a decimal number by an integer factor, truncating toward zero.
/// Integers are scaled exactly; `None` on overflow, negatives or garbage.
pub(crate) fn scale_unsigned(number: &str, factor: u128) -> Option<u128> {
    if number.is_empty() {
        return None;
    }
    if let Ok(n) = number.parse::<u128>() {
        return n.checked_mul(factor);
    }
    let f: f64 = number.parse().ok()?;
    if !f.is_finite() || f < 0.0 {
        return None;
    }
    let scaled = f * factor as f64;
    if scaled >= u128::MAX as f64 {
        return None;
    }
    Some(scaled as u128)
}
