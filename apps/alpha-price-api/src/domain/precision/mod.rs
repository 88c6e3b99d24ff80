//! Decimal Precision
//!
//! Conversion of loosely typed numeric input into exact decimals, and
//! quantization of results to a fixed number of fractional digits.
//!
//! Intermediate arithmetic always runs at full `Decimal` precision. Rounding
//! is applied exactly once, when a value leaves the domain for a response.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::error::AlphaError;

/// Default number of fractional digits in output values.
pub const DEFAULT_DECIMAL_PLACES: u32 = 8;

/// Largest scale a `Decimal` can carry.
pub const MAX_DECIMAL_PLACES: u32 = 28;

// =============================================================================
// Numeric Input
// =============================================================================

/// A number as it arrives from JSON, configuration, or callers.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericInput {
    /// Integral input.
    Integer(i64),
    /// Binary floating point input. Converted through its shortest
    /// round-trip string so `0.1` stays `0.1`.
    Float(f64),
    /// Textual input such as `"1.50000000"` or `"1e-8"`.
    Text(String),
    /// Already exact.
    Decimal(Decimal),
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for NumericInput {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for NumericInput {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl TryFrom<&Value> for NumericInput {
    type Error = AlphaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => n.as_i64().map_or_else(
                || {
                    n.as_f64()
                        .map(Self::Float)
                        .ok_or_else(|| AlphaError::InvalidNumber(n.to_string()))
                },
                |i| Ok(Self::Integer(i)),
            ),
            other => Err(AlphaError::InvalidNumber(other.to_string())),
        }
    }
}

/// Convert any supported input into an exact decimal.
///
/// Floats go through their string form to avoid binary artifacts.
///
/// # Errors
///
/// Returns [`AlphaError::InvalidNumber`] when the input is not a finite
/// number representable as a `Decimal`.
pub fn to_decimal(value: impl Into<NumericInput>) -> Result<Decimal, AlphaError> {
    match value.into() {
        NumericInput::Decimal(d) => Ok(d),
        NumericInput::Integer(i) => Ok(Decimal::from(i)),
        NumericInput::Float(f) => {
            if !f.is_finite() {
                return Err(AlphaError::InvalidNumber(f.to_string()));
            }
            parse_decimal(&f.to_string())
        }
        NumericInput::Text(s) => parse_decimal(&s),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, AlphaError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AlphaError::InvalidNumber(raw.to_string()));
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| AlphaError::InvalidNumber(raw.to_string()))
}

// =============================================================================
// Rounding
// =============================================================================

/// Tie-breaking rule used when quantizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Ties round away from zero (0.5 → 1, -0.5 → -1).
    #[default]
    HalfUp,
    /// Ties round to the even neighbour.
    HalfEven,
    /// Ties round toward zero.
    HalfDown,
    /// Truncate toward zero.
    Down,
    /// Round away from zero.
    Up,
}

impl RoundingMode {
    /// Parse a rounding mode name such as `HALF_UP` or `ROUND_HALF_UP`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        let name = normalized.strip_prefix("ROUND_").unwrap_or(&normalized);
        match name {
            "HALF_UP" => Some(Self::HalfUp),
            "HALF_EVEN" => Some(Self::HalfEven),
            "HALF_DOWN" => Some(Self::HalfDown),
            "DOWN" => Some(Self::Down),
            "UP" => Some(Self::Up),
            _ => None,
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HalfUp => "HALF_UP",
            Self::HalfEven => "HALF_EVEN",
            Self::HalfDown => "HALF_DOWN",
            Self::Down => "DOWN",
            Self::Up => "UP",
        }
    }

    const fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::Down => RoundingStrategy::ToZero,
            Self::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

/// Output precision policy: how many digits, and how ties break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    places: u32,
    rounding: RoundingMode,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            places: DEFAULT_DECIMAL_PLACES,
            rounding: RoundingMode::HalfUp,
        }
    }
}

impl Precision {
    /// Create a precision policy. `places` is clamped to
    /// [`MAX_DECIMAL_PLACES`].
    #[must_use]
    pub fn new(places: u32, rounding: RoundingMode) -> Self {
        Self {
            places: places.min(MAX_DECIMAL_PLACES),
            rounding,
        }
    }

    /// Configured number of fractional digits.
    #[must_use]
    pub const fn places(&self) -> u32 {
        self.places
    }

    /// Configured rounding mode.
    #[must_use]
    pub const fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Quantize to the configured number of places.
    #[must_use]
    pub fn quantize(&self, value: Decimal) -> Decimal {
        self.quantize_to(value, self.places)
    }

    /// Quantize to an explicit number of places.
    ///
    /// The result always carries exactly `places` fractional digits, so
    /// `1.5` at 8 places renders as `1.50000000`.
    #[must_use]
    pub fn quantize_to(&self, value: Decimal, places: u32) -> Decimal {
        let places = places.min(MAX_DECIMAL_PLACES);
        let mut rounded = value.round_dp_with_strategy(places, self.rounding.strategy());
        // round_dp never widens the scale; pad so output width is fixed.
        rounded.rescale(places);
        rounded
    }
}

/// Quantize with the default policy (8 places, round-half-up).
#[must_use]
pub fn quantize(value: Decimal) -> Decimal {
    Precision::default().quantize(value)
}

// =============================================================================
// Tests
// =============================================================================
