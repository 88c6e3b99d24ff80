//! HTTP request DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::diff_range::DiffRangeInput;
use crate::domain::precision::{NumericInput, to_decimal};
use crate::error::AlphaError;

/// Query string of `GET /api/alpha/price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuery {
    /// Alpha identifier, base symbol or pair symbol.
    #[serde(rename = "alphaId")]
    pub alpha_id: String,
}

/// Body of `POST /api/calc/price-range`.
///
/// Fields accept JSON numbers or numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRangeRequest {
    /// Current token price. Must be > 0.
    pub price_now: Value,
    /// Quote volume per trade. Must be > 0.
    pub per_volume: Value,
    /// Lower waste bound. Must be >= 0.
    pub waste_lower: Value,
    /// Upper waste bound. Must be >= 0.
    pub waste_upper: Value,
    /// Fee per trade in tokens. Must be >= 0.
    pub fee_amount_token: Value,
}

impl PriceRangeRequest {
    /// Convert and validate into calculator input.
    ///
    /// # Errors
    ///
    /// - [`AlphaError::InvalidNumber`] if a field is not numeric
    /// - [`AlphaError::InvalidInput`] if a field is out of range
    pub fn into_input(self) -> Result<DiffRangeInput, AlphaError> {
        Ok(DiffRangeInput {
            price_now: positive("price_now", &self.price_now)?,
            per_volume: positive("per_volume", &self.per_volume)?,
            waste_lower: non_negative("waste_lower", &self.waste_lower)?,
            waste_upper: non_negative("waste_upper", &self.waste_upper)?,
            fee_amount_token: non_negative("fee_amount_token", &self.fee_amount_token)?,
        })
    }
}

fn field(name: &str, value: &Value) -> Result<Decimal, AlphaError> {
    NumericInput::try_from(value)
        .and_then(to_decimal)
        .map_err(|_| AlphaError::InvalidNumber(format!("{name}: {value}")))
}

fn positive(name: &str, value: &Value) -> Result<Decimal, AlphaError> {
    let d = field(name, value)?;
    if d <= Decimal::ZERO {
        return Err(AlphaError::InvalidInput(format!("{name} must be > 0")));
    }
    Ok(d)
}

fn non_negative(name: &str, value: &Value) -> Result<Decimal, AlphaError> {
    let d = field(name, value)?;
    if d < Decimal::ZERO {
        return Err(AlphaError::InvalidInput(format!("{name} must be >= 0")));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn request(value: Value) -> PriceRangeRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn mixed_numbers_and_strings() {
        let input = request(json!({
            "price_now": "1",
            "per_volume": 100,
            "waste_lower": 3.5,
            "waste_upper": "5",
            "fee_amount_token": 0
        }))
        .into_input()
        .unwrap();

        assert_eq!(input.price_now, dec!(1));
        assert_eq!(input.per_volume, dec!(100));
        assert_eq!(input.waste_lower, dec!(3.5));
        assert_eq!(input.fee_amount_token, dec!(0));
    }

    #[test]
    fn zero_price_is_out_of_range() {
        let err = request(json!({
            "price_now": 0, "per_volume": 100,
            "waste_lower": 3, "waste_upper": 5, "fee_amount_token": 2
        }))
        .into_input()
        .unwrap_err();
        assert_eq!(err, AlphaError::InvalidInput("price_now must be > 0".to_string()));
    }

    #[test]
    fn negative_waste_is_out_of_range() {
        let err = request(json!({
            "price_now": 1, "per_volume": 100,
            "waste_lower": -1, "waste_upper": 5, "fee_amount_token": 2
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AlphaError::InvalidInput(m) if m.starts_with("waste_lower")));
    }

    #[test]
    fn non_numeric_field_is_invalid_number() {
        let err = request(json!({
            "price_now": "abc", "per_volume": 100,
            "waste_lower": 3, "waste_upper": 5, "fee_amount_token": 2
        }))
        .into_input()
        .unwrap_err();
        assert!(matches!(err, AlphaError::InvalidNumber(_)));
    }
}
