use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A currency value with exactly two decimal places, stored as whole cents.
///
/// All arithmetic, comparison, and persistence go through this type; floats
/// only appear at the JSON boundary and are converted (and validated) on the
/// way in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from a whole number of cents.
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// The value in cents.
    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Convert a JSON number into cents, rounding to the nearest cent
    /// (half-up). Rejects negative, NaN, and infinite inputs.
    pub fn from_f64(value: f64) -> Result<Self, CoreError> {
        if !value.is_finite() {
            return Err(CoreError::InvalidAmount(format!(
                "amount must be a finite number, got {value}"
            )));
        }
        if value < 0.0 {
            return Err(CoreError::InvalidAmount(format!(
                "amount must not be negative, got {value}"
            )));
        }
        let cents = (value * 100.0).round();
        // f64 loses integer precision past 2^53; anything that large is
        // garbage input, not a gift.
        if cents >= 9e15 {
            return Err(CoreError::InvalidAmount(format!(
                "amount out of range: {value}"
            )));
        }
        Ok(Self(cents as u64))
    }

    /// Lossy conversion for response bodies.
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// ISO 4217 currencies the float gateway can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// ISO 4217 code.
    pub fn code(&self) -> &str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// Parse from ISO 4217 code.
    pub fn from_code(code: &str) -> Result<Self, CoreError> {
        match code {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(CoreError::InvalidCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
