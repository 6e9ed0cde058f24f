//! Fixed-point money amounts.
//!
//! Amounts are stored as integer cents to keep ledger arithmetic exact.
//! Parsing accepts plain decimals plus the colloquial shorthand users type
//! into the assistant ("1.234,56", "1,5k", "2 mil"); formatting follows the
//! Brazilian convention ("R$ 1.234,56").

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a money amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    /// Input did not contain a usable number.
    #[error("not a valid amount: {0:?}")]
    Invalid(String),
    /// Parsed value overflows the cent representation.
    #[error("amount out of range: {0:?}")]
    OutOfRange(String),
}

/// A money amount in integer cents (2 decimal places).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create from whole currency units.
    #[must_use]
    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    /// The raw cent value.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Saturating sum of two amounts.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating difference of two amounts.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a plain or colloquial decimal string into cents.
    ///
    /// Accepted shapes:
    /// - `"1234.56"`, `"1234,56"` (either decimal separator)
    /// - `"1.234,56"`, `"1,234.56"` (thousands + decimal separators)
    /// - `"R$ 50"`, `"50 reais"` (currency markers stripped)
    /// - `"1,5k"`, `"2 mil"` (thousand shorthand)
    pub fn parse(input: &str) -> Result<Self, AmountParseError> {
        let mut s = input.trim().to_lowercase();
        for marker in ["r$", "reais", "real", "rs"] {
            s = s.replace(marker, "");
        }
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Invalid(input.to_string()));
        }

        let (s, multiplier) = if let Some(rest) = s.strip_suffix('k') {
            (rest.trim(), 1000_i64)
        } else if let Some(rest) = s.strip_suffix("mil") {
            (rest.trim(), 1000_i64)
        } else {
            (s, 1_i64)
        };
        // Bare "mil" means one thousand.
        let s = if s.is_empty() && multiplier == 1000 { "1" } else { s };

        let normalized = normalize_separators(s)
            .ok_or_else(|| AmountParseError::Invalid(input.to_string()))?;

        let (int_part, frac_part) = match normalized.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (normalized, String::new()),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(AmountParseError::Invalid(input.to_string()));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::Invalid(input.to_string()));
        }

        let units: i64 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| AmountParseError::OutOfRange(input.to_string()))?
        };

        // Fraction truncated to 2 places, right-padded with zeros.
        let mut frac = frac_part;
        frac.truncate(2);
        while frac.len() < 2 {
            frac.push('0');
        }
        let frac: i64 = frac.parse().unwrap_or(0);

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .and_then(|c| c.checked_mul(multiplier))
            .map(Self)
            .ok_or_else(|| AmountParseError::OutOfRange(input.to_string()))
    }

    /// Format in the Brazilian convention: `R$ 1.234,56`.
    #[must_use]
    pub fn format_brl(self) -> String {
        let negative = self.0 < 0;
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;

        let digits = units.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if negative { "-" } else { "" };
        format!("{sign}R$ {grouped},{cents:02}")
    }
}

impl fmt::Display for Amount {
    /// Plain decimal with a dot separator, e.g. `1234.56`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.0 < 0;
        let abs = self.0.unsigned_abs();
        let sign = if negative { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Reduce a digit string with `.`/`,` separators to a canonical `1234.56`.
///
/// The last separator is treated as the decimal point when its fraction has
/// 1-2 digits; separators followed by exactly 3 digits are thousands marks.
fn normalize_separators(s: &str) -> Option<String> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let last_sep = s.rfind(['.', ',']);
    let Some(pos) = last_sep else {
        return Some(s);
    };

    let tail = &s[pos + 1..];
    let head = &s[..pos];
    let strip = |part: &str| part.replace(['.', ','], "");

    if tail.len() == 3 && !head.contains(['.', ',']) && head.len() <= 3 && !head.is_empty() {
        // Ambiguous "1.234": a single separator with a 3-digit tail reads as
        // a thousands mark in pt-BR input.
        return Some(format!("{}{tail}", strip(head)));
    }

    if tail.len() <= 2 {
        Some(format!("{}.{tail}", strip(head)))
    } else {
        // 3+ digit tail with other separators present: all thousands marks.
        Some(strip(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(input: &str) -> i64 {
        Amount::parse(input).unwrap().cents()
    }

    #[test]
    fn parse_plain_decimal() {
        assert_eq!(cents("1234.56"), 123_456);
        assert_eq!(cents("50"), 5_000);
        assert_eq!(cents("0.99"), 99);
    }

    #[test]
    fn parse_brazilian_format() {
        assert_eq!(cents("1.234,56"), 123_456);
        assert_eq!(cents("1234,56"), 123_456);
        assert_eq!(cents("12.345.678,90"), 1_234_567_890);
    }

    #[test]
    fn parse_us_format() {
        assert_eq!(cents("1,234.56"), 123_456);
    }

    #[test]
    fn parse_currency_markers() {
        assert_eq!(cents("R$ 50"), 5_000);
        assert_eq!(cents("50 reais"), 5_000);
    }

    #[test]
    fn parse_thousand_shorthand() {
        assert_eq!(cents("1,5k"), 150_000);
        assert_eq!(cents("1.2k"), 120_000);
        assert_eq!(cents("2 mil"), 200_000);
        assert_eq!(cents("mil"), 100_000);
    }

    #[test]
    fn parse_single_dot_thousands() {
        // "1.234" in pt-BR input is one thousand two hundred thirty four.
        assert_eq!(cents("1.234"), 123_400);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("abc").is_err());
        assert!(Amount::parse("12a4").is_err());
    }

    #[test]
    fn fraction_truncated_to_two_places() {
        assert_eq!(cents("1.999"), 199_900); // thousands, not fraction
        assert_eq!(cents("1,5"), 150);
    }

    #[test]
    fn display_plain() {
        assert_eq!(Amount::from_cents(123_456).to_string(), "1234.56");
        assert_eq!(Amount::from_cents(-50).to_string(), "-0.50");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn format_brl_groups_thousands() {
        assert_eq!(Amount::from_cents(123_456).format_brl(), "R$ 1.234,56");
        assert_eq!(Amount::from_cents(150_000_000).format_brl(), "R$ 1.500.000,00");
        assert_eq!(Amount::from_cents(5_000).format_brl(), "R$ 50,00");
    }

    #[test]
    fn format_brl_negative() {
        assert_eq!(Amount::from_cents(-123_456).format_brl(), "-R$ 1.234,56");
    }

    #[test]
    fn saturating_arithmetic() {
        let a = Amount::from_major(10);
        let b = Amount::from_major(4);
        assert_eq!(a.saturating_sub(b), Amount::from_major(6));
        assert_eq!(a.saturating_add(b), Amount::from_major(14));
    }

    #[test]
    fn serde_transparent_cents() {
        let json = serde_json::to_string(&Amount::from_cents(123)).unwrap();
        assert_eq!(json, "123");
    }
}
