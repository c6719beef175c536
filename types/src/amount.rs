//! Human-readable token amounts as typed by the user.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount contains invalid character `{0}`")]
    InvalidCharacter(char),
    #[error("amount contains more than one decimal point")]
    MultipleDecimalPoints,
    #[error("amount has {found} decimal places, token supports {max}")]
    TooManyDecimals { max: u8, found: usize },
    #[error("amount is empty")]
    Empty,
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// A decimal string such as `""`, `"12"`, `"0.5"` or `"3."`.
///
/// Only ASCII digits and at most one `.` are ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(String);

impl TokenAmount {
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Strict parse: rejects anything that is not digits plus an optional
    /// single decimal point.
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        let mut seen_point = false;
        for c in raw.chars() {
            match c {
                '0'..='9' => {}
                '.' if seen_point => return Err(AmountError::MultipleDecimalPoints),
                '.' => seen_point = true,
                other => return Err(AmountError::InvalidCharacter(other)),
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// Lenient parse for keyboard and clipboard input.
    ///
    /// Commas become decimal points, every other non-digit is dropped, only
    /// the first decimal point survives and the fraction is cut to
    /// `max_decimals` places.
    #[must_use]
    pub fn sanitize(raw: &str, max_decimals: u8) -> Self {
        let mut integer = String::new();
        let mut fraction: Option<String> = None;
        for c in raw.chars() {
            let c = if c == ',' { '.' } else { c };
            match (c, fraction.as_mut()) {
                ('0'..='9', None) => integer.push(c),
                ('0'..='9', Some(frac)) => frac.push(c),
                ('.', None) => fraction = Some(String::new()),
                _ => {}
            }
        }
        match fraction {
            None => Self(integer),
            Some(mut frac) => {
                frac.truncate(usize::from(max_decimals));
                Self(format!("{integer}.{frac}"))
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.chars().any(|c| matches!(c, '1'..='9'))
    }

    /// Lossy numeric view, for USD estimates only.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        if self.0.is_empty() || self.0 == "." {
            return 0.0;
        }
        self.0.parse().unwrap_or(0.0)
    }

    /// Scale into integer base units (`amount * 10^decimals`).
    pub fn to_base_units(&self, decimals: u8) -> Result<U256, AmountError> {
        if self.0.is_empty() || self.0 == "." {
            return Err(AmountError::Empty);
        }
        let (integer, fraction) = self.0.split_once('.').unwrap_or((self.0.as_str(), ""));
        if fraction.len() > usize::from(decimals) {
            return Err(AmountError::TooManyDecimals {
                max: decimals,
                found: fraction.len(),
            });
        }
        let mut digits = String::with_capacity(integer.len() + usize::from(decimals));
        digits.push_str(integer);
        digits.push_str(fraction);
        digits.extend(std::iter::repeat_n('0', usize::from(decimals) - fraction.len()));
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        digits.parse::<U256>().map_err(|_| AmountError::Overflow)
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TokenAmount> for String {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_second_point_and_letters() {
        assert_eq!(
            TokenAmount::parse("1.2.3"),
            Err(AmountError::MultipleDecimalPoints)
        );
        assert_eq!(
            TokenAmount::parse("1e5"),
            Err(AmountError::InvalidCharacter('e'))
        );
        assert!(TokenAmount::parse("").unwrap().is_empty());
        assert_eq!(TokenAmount::parse("0.25").unwrap().as_str(), "0.25");
    }

    #[test]
    fn sanitize_normalizes_user_input() {
        assert_eq!(TokenAmount::sanitize("1,5", 18).as_str(), "1.5");
        assert_eq!(TokenAmount::sanitize("$1.2.3", 18).as_str(), "1.23");
        assert_eq!(TokenAmount::sanitize("-7a", 18).as_str(), "7");
        assert_eq!(TokenAmount::sanitize("0.123456", 4).as_str(), "0.1234");
        assert_eq!(TokenAmount::sanitize("12.5", 0).as_str(), "12.");
        assert_eq!(TokenAmount::sanitize("3.", 6).as_str(), "3.");
    }

    #[test]
    fn positivity_ignores_zero_padding() {
        assert!(!TokenAmount::parse("0.000").unwrap().is_positive());
        assert!(!TokenAmount::empty().is_positive());
        assert!(TokenAmount::parse("0.001").unwrap().is_positive());
    }

    #[test]
    fn base_units_scale_by_decimals() {
        let amount = TokenAmount::parse("1.5").unwrap();
        assert_eq!(
            amount.to_base_units(6).unwrap(),
            U256::from(1_500_000u64)
        );
        assert_eq!(
            TokenAmount::parse("0.0").unwrap().to_base_units(18).unwrap(),
            U256::ZERO
        );
        assert_eq!(
            TokenAmount::parse("2.").unwrap().to_base_units(2).unwrap(),
            U256::from(200u64)
        );
    }

    #[test]
    fn base_units_reject_excess_precision() {
        let amount = TokenAmount::parse("0.1234567").unwrap();
        assert_eq!(
            amount.to_base_units(6),
            Err(AmountError::TooManyDecimals { max: 6, found: 7 })
        );
        assert_eq!(TokenAmount::empty().to_base_units(6), Err(AmountError::Empty));
    }
}
