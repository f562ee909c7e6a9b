//! Interval — the duration literal controlling how often triggers run.
//!
//! Grammar: one or more ASCII digits followed by a unit, `ms`, `s`, `m` or
//! `h`. No whitespace, sign, or fractional part is accepted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Unit suffix of an [`Interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Millis,
    Seconds,
    Minutes,
    Hours,
}

impl Unit {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }
}

/// A parsed duration literal such as `5m` or `1500ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub magnitude: u64,
    pub unit: Unit,
}

/// Why a duration literal was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("interval is empty")]
    Empty,

    #[error("'{0}' is not a valid duration")]
    Malformed(String),

    #[error("'{0}' is shorter than 1s")]
    TooShort(String),
}

impl Interval {
    /// Reject `s` below 1 and `ms` below 1000. `m` and `h` have no minimum.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::TooShort`] when the interval is under one second.
    pub fn check_minimum(self) -> Result<Self, IntervalError> {
        let too_short = match self.unit {
            Unit::Seconds => self.magnitude < 1,
            Unit::Millis => self.magnitude < 1000,
            Unit::Minutes | Unit::Hours => false,
        };
        if too_short {
            return Err(IntervalError::TooShort(self.to_string()));
        }
        Ok(self)
    }

    /// Convert into a [`Duration`], saturating on overflow.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        match self.unit {
            Unit::Millis => Duration::from_millis(self.magnitude),
            Unit::Seconds => Duration::from_secs(self.magnitude),
            Unit::Minutes => Duration::from_secs(self.magnitude.saturating_mul(60)),
            Unit::Hours => Duration::from_secs(self.magnitude.saturating_mul(3600)),
        }
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IntervalError::Empty);
        }
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, suffix) = s.split_at(split);
        let unit = match suffix {
            "ms" => Unit::Millis,
            "s" => Unit::Seconds,
            "m" => Unit::Minutes,
            "h" => Unit::Hours,
            _ => return Err(IntervalError::Malformed(s.to_string())),
        };
        if digits.is_empty() {
            return Err(IntervalError::Malformed(s.to_string()));
        }
        // Digit runs too long for u64 are still well-formed; clamp them.
        let magnitude = digits.parse().unwrap_or(u64::MAX);
        Ok(Self { magnitude, unit })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.as_str())
    }
}
