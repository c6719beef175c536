use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SlippageError {
    #[error("Slippage cannot be lower than {}%", Slippage::MIN_PERCENT)]
    BelowMinimum(f64),
    #[error("Slippage cannot be higher than {}%", Slippage::MAX_PERCENT)]
    AboveMaximum(f64),
    #[error("Slippage must be a finite number")]
    NotFinite,
}

/// Slippage tolerance in percent, always within `[MIN_PERCENT, MAX_PERCENT]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Slippage(f64);

impl Slippage {
    pub const MIN_PERCENT: f64 = 0.1;
    pub const MAX_PERCENT: f64 = 50.0;

    pub const DEFAULT: Slippage = Slippage(1.0);
    /// Used while both tokens track the same peg.
    pub const STABLE: Slippage = Slippage(0.1);

    pub fn new(percent: f64) -> Result<Self, SlippageError> {
        if !percent.is_finite() {
            return Err(SlippageError::NotFinite);
        }
        if percent < Self::MIN_PERCENT {
            return Err(SlippageError::BelowMinimum(percent));
        }
        if percent > Self::MAX_PERCENT {
            return Err(SlippageError::AboveMaximum(percent));
        }
        Ok(Self(percent))
    }

    #[must_use]
    pub const fn percent(self) -> f64 {
        self.0
    }

    /// Above the default tolerance; the UI highlights it.
    #[must_use]
    pub fn is_high(self) -> bool {
        self.0 > Self::DEFAULT.0
    }

    /// Tolerance in basis points, as routing APIs expect it.
    #[must_use]
    pub fn basis_points(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

impl Default for Slippage {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Slippage {
    type Error = SlippageError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slippage> for f64 {
    fn from(value: Slippage) -> Self {
        value.0
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(Slippage::new(0.1).unwrap().percent(), 0.1);
        assert_eq!(Slippage::new(50.0).unwrap().percent(), 50.0);
        assert!(matches!(
            Slippage::new(0.05),
            Err(SlippageError::BelowMinimum(_))
        ));
        assert!(matches!(
            Slippage::new(51.0),
            Err(SlippageError::AboveMaximum(_))
        ));
        assert_eq!(Slippage::new(f64::NAN), Err(SlippageError::NotFinite));
    }

    #[test]
    fn error_messages_match_ui_copy() {
        assert_eq!(
            SlippageError::BelowMinimum(0.0).to_string(),
            "Slippage cannot be lower than 0.1%"
        );
        assert_eq!(
            SlippageError::AboveMaximum(99.0).to_string(),
            "Slippage cannot be higher than 50%"
        );
    }

    #[test]
    fn high_means_above_default() {
        assert!(!Slippage::DEFAULT.is_high());
        assert!(Slippage::new(1.5).unwrap().is_high());
        assert_eq!(Slippage::new(0.5).unwrap().basis_points(), 50);
    }

    #[test]
    fn deserialize_validates_range() {
        assert!(serde_json::from_str::<Slippage>("3.0").is_ok());
        assert!(serde_json::from_str::<Slippage>("0.01").is_err());
    }
}
