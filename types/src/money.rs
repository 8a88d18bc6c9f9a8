//! Monetary amounts held as integer minor units.
//!
//! The backend serializes amounts as JSON decimals. We never do float
//! arithmetic on money; values are converted to minor units (hundredths)
//! at the boundary and kept as `i64` from then on.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A monetary amount in minor units (hundredths of the major unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("amount is not a valid decimal number")]
    Invalid,
    #[error("amount has more than two decimal places")]
    TooPrecise,
    #[error("amount is out of range")]
    OutOfRange,
}

impl Amount {
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Parse a user-entered or API-provided decimal string.
    ///
    /// Accepts an optional sign, thousands separators, and up to two
    /// decimal places: `"1,234.56"` -> 123456 minor units.
    pub fn parse(input: &str) -> Result<Self, AmountParseError> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(AmountParseError::Invalid);
        }

        let (sign, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, cleaned.as_str()),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountParseError::Invalid);
        }
        if frac_part.len() > 2 {
            return Err(AmountParseError::TooPrecise);
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::Invalid);
        }

        let int_value: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| AmountParseError::OutOfRange)?
        };

        let mut frac_value: i64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| AmountParseError::Invalid)?
        };
        if frac_part.len() == 1 {
            frac_value *= 10;
        }

        int_value
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac_value))
            .map(|v| Self(sign * v))
            .ok_or(AmountParseError::OutOfRange)
    }

    /// Format with thousands separators and two decimal places: `1,234.50`.
    #[must_use]
    pub fn formatted(self) -> String {
        let minor = self.0.abs();
        let major = minor / 100;
        let cents = minor % 100;

        let digits = major.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{grouped}.{cents:02}")
    }

    /// Format with a currency code prefix: `NGN 1,234.50`.
    #[must_use]
    pub fn formatted_with(self, currency: &str) -> String {
        format!("{currency} {}", self.formatted())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The backend expects a JSON decimal. i64 minor units divided by
        // 100 are representable exactly enough for serde_json's shortest
        // round-trip formatting at two decimal places.
        #[allow(clippy::cast_precision_loss)]
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        v.checked_mul(100)
            .map(Amount)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Amount)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        // Route through the string parser so "10.1" and 10.1 agree.
        Amount::parse(&format!("{v}")).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::parse(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_grouped_input() {
        assert_eq!(Amount::parse("1234.56"), Ok(Amount::from_minor(123_456)));
        assert_eq!(Amount::parse("1,234.56"), Ok(Amount::from_minor(123_456)));
        assert_eq!(Amount::parse("1000"), Ok(Amount::from_minor(100_000)));
        assert_eq!(Amount::parse("0.5"), Ok(Amount::from_minor(50)));
        assert_eq!(Amount::parse("-12.34"), Ok(Amount::from_minor(-1234)));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Amount::parse(""), Err(AmountParseError::Invalid));
        assert_eq!(Amount::parse("abc"), Err(AmountParseError::Invalid));
        assert_eq!(Amount::parse("1.234"), Err(AmountParseError::TooPrecise));
        assert_eq!(Amount::parse("."), Err(AmountParseError::Invalid));
    }

    #[test]
    fn formats_with_grouping() {
        assert_eq!(Amount::from_minor(123_456_789).formatted(), "1,234,567.89");
        assert_eq!(Amount::from_minor(50).formatted(), "0.50");
        assert_eq!(Amount::from_minor(-1234).formatted(), "-12.34");
        assert_eq!(
            Amount::from_minor(100_000).formatted_with("NGN"),
            "NGN 1,000.00"
        );
    }

    #[test]
    fn deserializes_from_number_and_string() {
        let from_num: Amount = serde_json::from_str("1234.5").unwrap();
        assert_eq!(from_num, Amount::from_minor(123_450));

        let from_int: Amount = serde_json::from_str("1000").unwrap();
        assert_eq!(from_int, Amount::from_minor(100_000));

        let from_str: Amount = serde_json::from_str("\"99.99\"").unwrap();
        assert_eq!(from_str, Amount::from_minor(9999));
    }

    #[test]
    fn serializes_as_decimal() {
        let json = serde_json::to_string(&Amount::from_minor(123_450)).unwrap();
        assert_eq!(json, "1234.5");
    }
}
