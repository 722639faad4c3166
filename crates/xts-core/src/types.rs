//! Core type definitions with validation.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds in one tenth of an hour.
const SECONDS_PER_TENTH: i64 = 360;

/// Rounding bias applied before truncating to tenths (three minutes).
const ROUNDING_BIAS_SECONDS: i64 = 180;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The hourly rate was zero, negative or not a number.
    #[error("rate {value} is not valid")]
    InvalidRate { value: String },
}

/// A count of tenth-hour units, the granularity every report is shown in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tenths(u64);

impl Tenths {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(tenths: u64) -> Self {
        Self(tenths)
    }

    /// Rounds whole seconds to the nearest tenth of an hour.
    ///
    /// Anything at or above three minutes past a tenth boundary rounds up, so
    /// 179 seconds is zero and 181 seconds is one tenth. Negative input is
    /// treated as zero.
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        let units = (seconds.max(0) + ROUNDING_BIAS_SECONDS) / SECONDS_PER_TENTH;
        Self(units.unsigned_abs())
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Hours as a float, for fee arithmetic and JSON output.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "tenth counts stay far below 2^52")]
    pub fn hours(self) -> f64 {
        self.0 as f64 / 10.0
    }

    /// Difference, clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format!("{}.{}", self.0 / 10, self.0 % 10);
        // Numbers right-align by default, `{:4}` included.
        match (f.width(), f.align()) {
            (Some(width), None) => write!(f, "{text:>width$}"),
            _ => f.pad(&text),
        }
    }
}

impl Add for Tenths {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Tenths {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Tenths {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl Sum for Tenths {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Parses an hourly rate given on the command line when creating a sheet.
///
/// Sheets themselves are lenient about rates; this is only used where a bad
/// rate should be refused up front.
pub fn parse_rate(value: &str) -> Result<f64, ValidationError> {
    match value.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(ValidationError::InvalidRate {
            value: value.to_string(),
        }),
    }
}
